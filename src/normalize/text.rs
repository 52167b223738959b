use regex::Regex;
use std::sync::OnceLock;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"))
}

fn title_noise_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\s*[-–|(\[]?\s*\b(job\s*id|req(uisition)?(\s*id)?|job\s*#|req\s*#)\s*[:#]?\s*[a-z0-9_-]+\s*[)\]]?\s*$")
            .expect("valid regex")
    })
}

pub fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&amp;", "&")
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greenhouse 的 content 是被 escape 過的 HTML，所以先解碼再去標籤
pub fn strip_html(text: &str) -> String {
    let unescaped = decode_entities(text);
    let without_tags = tag_pattern().replace_all(&unescaped, " ");
    collapse_whitespace(&decode_entities(&without_tags))
}

/// 去掉職稱尾端的 "- Job ID 1234"、"(Req #A12)" 之類雜訊
pub fn clean_title(title: &str) -> String {
    let plain = strip_html(title);
    let trimmed = title_noise_pattern().replace(&plain, "");
    trimmed
        .trim()
        .trim_end_matches(['-', '–', '|', ',', ':'])
        .trim()
        .to_string()
}

/// Title key used for fingerprints and fuzzy matching.
pub fn normalize_title(title: &str) -> String {
    let lowered: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let collapsed = format!(" {} ", collapse_whitespace(&lowered));

    let synonyms = [
        (" psychiatric mental health nurse practitioner ", " pmhnp "),
        (" psychiatric nurse practitioner ", " pmhnp "),
        (" mental health nurse practitioner ", " pmhnp "),
        (" psych nurse practitioner ", " pmhnp "),
        (" psychiatric np ", " pmhnp "),
        (" psych np ", " pmhnp "),
        (" pmh np ", " pmhnp "),
        (" nurse practitioner ", " np "),
    ];

    let mut result = collapsed;
    for (from, to) in synonyms {
        result = result.replace(from, to);
    }
    collapse_whitespace(&result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_escaped_html() {
        let content = "&lt;p&gt;Join our &lt;strong&gt;telehealth&lt;/strong&gt; team &amp;amp; grow&lt;/p&gt;";
        assert_eq!(strip_html(content), "Join our telehealth team & grow");
    }

    #[test]
    fn test_clean_title_removes_requisition_noise() {
        assert_eq!(
            clean_title("Psychiatric Nurse Practitioner - Job ID 48213"),
            "Psychiatric Nurse Practitioner"
        );
        assert_eq!(clean_title("PMHNP (Req #A-991)"), "PMHNP");
        assert_eq!(clean_title("  PMHNP &amp; Therapist  "), "PMHNP & Therapist");
    }

    #[test]
    fn test_normalize_title_synonyms() {
        assert_eq!(
            normalize_title("Psychiatric Mental Health Nurse Practitioner (Remote)"),
            "pmhnp remote"
        );
        assert_eq!(normalize_title("PMHNP - Remote"), "pmhnp remote");
        assert_eq!(normalize_title("Psych NP, Outpatient"), "pmhnp outpatient");
    }
}
