const LEGAL_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "llc",
    "pllc",
    "pc",
    "corp",
    "corporation",
    "co",
    "company",
    "ltd",
    "lp",
    "llp",
    "pa",
];

const UNKNOWN_EMPLOYER: &str = "Unknown Employer";

/// Lowercased, punctuation-free company key with legal suffixes removed.
///
/// `normalize_company_name(normalize_company_name(x)) == normalize_company_name(x)` for any input.
pub fn normalize_company_name(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .replace('&', " and ")
        .chars()
        .filter(|c| *c != '.' && *c != '\'' && *c != '’')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();

    while tokens.len() > 1 && tokens[0] == "the" {
        tokens.remove(0);
    }
    while tokens.len() > 1 && tokens.last().is_some_and(|t| LEGAL_SUFFIXES.contains(t)) {
        tokens.pop();
    }

    tokens.join(" ")
}

pub fn display_company_name(name: Option<&str>) -> String {
    match name.map(|n| crate::normalize::text::collapse_whitespace(n.trim())) {
        Some(n) if !n.is_empty() => n,
        _ => UNKNOWN_EMPLOYER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_suffixes_and_punctuation() {
        assert_eq!(normalize_company_name("Talkiatry, Inc."), "talkiatry");
        assert_eq!(normalize_company_name("The Mindful Clinic, PLLC"), "mindful clinic");
        assert_eq!(normalize_company_name("Brightside Health L.L.C."), "brightside health");
        assert_eq!(normalize_company_name("Johnson & Johnson"), "johnson and johnson");
        assert_eq!(normalize_company_name("  O'Neil   Behavioral  Co "), "oneil behavioral");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let names = [
            "Talkiatry, Inc.",
            "The The Clinic",
            "The Co",
            "ACME Corp LLC",
            "LifeStance Health Group, Inc",
            "",
            "Inc.",
            "Mental Health & Wellness, P.C.",
        ];

        for name in names {
            let once = normalize_company_name(name);
            assert_eq!(normalize_company_name(&once), once, "input: {:?}", name);
        }
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(display_company_name(Some("  Cerebral ")), "Cerebral");
        assert_eq!(display_company_name(Some("   ")), "Unknown Employer");
        assert_eq!(display_company_name(None), "Unknown Employer");
    }
}
