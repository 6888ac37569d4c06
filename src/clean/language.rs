use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::source::title_case;

/// Export language labels → plain language names.
static LANGUAGE_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("Albanian", "albanian"),
        ("English", "english"),
        ("Afrikaans", "afrikaans"),
        ("Català - Catalan (beta)", "catalan"),
        ("Deutsch - German", "german"),
        ("Français - French", "french"),
        ("বাংলা - Bengali", "bengali"),
        ("Dansk - Danish", "danish"),
        ("Hmong", "hmong"),
        ("Gaeilge - Irish (beta)", "irish"),
        ("Hausa", "hausa"),
        ("Esperanto", "esperanto"),
        ("Estonian", "estonian"),
        ("Čeština - Czech", "czech"),
        ("Belarusian", "belarusian"),
        ("Azerbaijani", "azerbaijani"),
        ("Bosnian", "bosnian"),
        ("Haitian Creole", "haitiancreole"),
        ("Bulgarian", "bulgarian"),
        ("Galego - Galician (beta)", "galician"),
        ("Nepali", "nepali"),
        ("Português - Portuguese", "portuguese"),
        ("Italiano - Italian", "italian"),
        ("Euskara - Basque (beta)", "basque"),
        ("Tagalog", "tagalog"),
        ("Croatian", "croatian"),
        ("Bahasa Indonesia - Indonesian", "indonesian"),
        ("Nyanja", "nyanja"),
        ("Igbo", "igbo"),
        ("العربية - Arabic", "arabic"),
        ("Español - Spanish", "spanish"),
        ("Nederlands - Dutch", "dutch"),
        ("Corsican", "corsican"),
        ("Türkçe - Turkish", "turkish"),
        ("Sindhi", "sindhi"),
        ("Polski - Polish", "polish"),
        ("Maltese", "maltese"),
        ("Latin", "latin"),
        ("Welsh", "welsh"),
        ("Cebuano", "cebuano"),
        ("Română - Romanian", "romanian"),
        ("Kazakh", "kazakh"),
        ("Hawaiian", "hawaiian"),
        ("Swahili", "swahili"),
        ("Suomi - Finnish", "finnish"),
        ("Русский - Russian", "russian"),
        ("Macedonian", "macedonian"),
        ("Luxembourgish", "luxembourgish"),
        ("Magyar - Hungarian", "hungarian"),
        ("Norsk - Norwegian", "norwegian"),
        ("Yoruba", "yoruba"),
        ("Somali", "somali"),
        ("Latvian", "latvian"),
        ("Lithuanian", "lithuanian"),
        ("हिन्दी - Hindi", "hindi"),
        ("Українська мова - Ukrainian", "ukrainian"),
        ("Icelandic", "icelandic"),
        ("Svenska - Swedish", "swedish"),
    ]
    .into_iter()
    .collect()
});

/// Standardize a language cell: `nan` and blanks become "", known export
/// labels are mapped, everything is title-cased.
pub fn standardize_language(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return String::new();
    }
    let mapped = LANGUAGE_MAP.get(trimmed).copied().unwrap_or(trimmed);
    title_case(mapped)
}
