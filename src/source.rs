// src/source.rs

//! Input discovery and country labels derived from file names.

use anyhow::{Context, Result};
use glob::glob;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Three-letter codes used in export file names.
static COUNTRY_CODES: &[(&str, &str)] = &[
    ("BEL", "Belgium"),
    ("FRA", "France"),
    ("GER", "Germany"),
    ("DEU", "Germany"),
    ("ITA", "Italy"),
    ("NLD", "Netherlands"),
    ("PRT", "Portugal"),
    ("UGA", "Uganda"),
    ("GBR", "UK"),
];

/// Suffixes this crate appends to its own outputs.
static OUTPUT_SUFFIXES: &[&str] = &["_cleaned", "_classified"];

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Country label for an input file.
///
/// `GBR (3).csv` → `UK`, `united kingdom.csv` → `United Kingdom`,
/// `Germany_cleaned.csv` → `Germany`. Known country names keep their
/// canonical spelling, so labels survive a clean → classify round trip.
pub fn country_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut stem = stem.as_str();
    for suffix in OUTPUT_SUFFIXES {
        if let Some(s) = stem.strip_suffix(suffix) {
            stem = s;
        }
    }
    let raw = stem.split('(').next().unwrap_or("").trim();

    if let Some((_, name)) = COUNTRY_CODES
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(raw))
    {
        return name.to_string();
    }

    if raw.chars().count() == 3 {
        let code = raw.to_uppercase();
        COUNTRY_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| raw.to_string())
    } else {
        title_case(raw)
    }
}

/// Staging files, skip reports and classified tables this crate writes.
/// None of them is ever an input.
fn is_own_output(name: &str) -> bool {
    name.starts_with('.') || name.ends_with("_skipped.csv") || name.ends_with("_classified.csv")
}

/// All `*.csv` files directly under `dir`, grouped by country label. Files
/// within a group keep path order.
pub fn discover_sources(dir: &Path) -> Result<BTreeMap<String, Vec<PathBuf>>> {
    let pattern = format!("{}/*.csv", dir.display());
    let mut paths: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("invalid glob pattern {}", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .filter(|p| {
            let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
            !is_own_output(name)
        })
        .collect();
    paths.sort();

    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in paths {
        groups.entry(country_from_path(&path)).or_default().push(path);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn codes_map_to_country_names() {
        assert_eq!(country_from_path(Path::new("GBR (3).csv")), "UK");
        assert_eq!(country_from_path(Path::new("dir/deu.csv")), "Germany");
        assert_eq!(country_from_path(Path::new("NLD(1).csv")), "Netherlands");
    }

    #[test]
    fn unknown_codes_are_kept_as_written() {
        assert_eq!(country_from_path(Path::new("esp (2).csv")), "esp");
    }

    #[test]
    fn long_names_are_title_cased() {
        assert_eq!(
            country_from_path(Path::new("united kingdom (4).csv")),
            "United Kingdom"
        );
        assert_eq!(country_from_path(Path::new("FRANCE.csv")), "France");
    }

    #[test]
    fn our_own_suffixes_are_stripped() {
        assert_eq!(country_from_path(Path::new("UK_cleaned.csv")), "UK");
        assert_eq!(
            country_from_path(Path::new("Netherlands_cleaned.csv")),
            "Netherlands"
        );
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("haitian creole"), "Haitian Creole");
        assert_eq!(title_case("o'neil-SMITH"), "O'Neil-Smith");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn discovery_groups_by_country() -> Result<()> {
        let dir = tempdir()?;
        for name in [
            "GBR (1).csv",
            "GBR (2).csv",
            "FRA.csv",
            "notes.txt",
            "UK_skipped.csv",
            "UK_classified.csv",
            ".UK_cleaned.csv",
        ] {
            fs::write(dir.path().join(name), "Message\nhi\n")?;
        }
        let groups = discover_sources(dir.path())?;
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["France", "UK"]);
        assert_eq!(groups["UK"].len(), 2);
        assert!(groups["UK"][0] < groups["UK"][1]);
        Ok(())
    }
}
