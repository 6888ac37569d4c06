use once_cell::sync::Lazy;
use regex::Regex;

static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        "[",
        "\u{1F600}-\u{1F64F}",
        "\u{1F300}-\u{1F5FF}",
        "\u{1F680}-\u{1F6FF}",
        "\u{1F1E0}-\u{1F1FF}",
        "\u{2700}-\u{27BF}",
        "\u{1F900}-\u{1F9FF}",
        "\u{1FA00}-\u{1FAFF}",
        "]"
    ))
    .expect("emoji class is a constant and must compile")
});

pub fn has_emoji(s: &str) -> bool {
    EMOJI.is_match(s)
}

/// A one-character message carries no text unless that character is an emoji.
pub fn is_degenerate_message(s: &str) -> bool {
    s.chars().count() == 1 && !has_emoji(s)
}

/// Platform name from the export's free-text media type.
pub fn platform_from_media_type(media_type: Option<&str>) -> &'static str {
    let m = match media_type {
        Some(m) => m.trim().to_lowercase(),
        None => return "unknown",
    };
    if m.contains("twitter") {
        "X"
    } else if m.contains("facebook") {
        "facebook"
    } else if m.contains("linkedin") {
        "linkedin"
    } else if m.contains("tiktok") {
        "tiktok"
    } else if m.contains("instagram") {
        "instagram"
    } else if m.contains("trustpilot") {
        "trustpilot"
    } else {
        "other"
    }
}
