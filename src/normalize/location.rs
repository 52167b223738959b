use crate::domain::model::ParsedLocation;
use crate::normalize::text::collapse_whitespace;
use regex::Regex;
use std::sync::OnceLock;

const STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

const NOT_SPECIFIED: &str = "Not specified";

fn remote_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(remote|telehealth|telemedicine|telepsychiatry|work from home|wfh)\b")
            .expect("valid regex")
    })
}

fn hybrid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\bhybrid\b").expect("valid regex"))
}

fn noise_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(remote|telehealth|telemedicine|telepsychiatry|work from home|wfh|hybrid|on-?site|in-?person|united states of america|united states|usa|us)\b",
        )
        .expect("valid regex")
    })
}

fn multi_separator() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 只認小寫的 " or "，大寫 OR 是 Oregon
    PATTERN.get_or_init(|| Regex::new(r"\s*[;|]\s*|\s+or\s+").expect("valid regex"))
}

/// Two-letter code for a state code or full state name.
pub fn resolve_state(value: &str) -> Option<&'static str> {
    let trimmed = value.trim().trim_matches('.');
    if trimmed.is_empty() {
        return None;
    }

    STATES
        .iter()
        .find(|(code, name)| {
            (trimmed.len() == 2 && code.eq_ignore_ascii_case(trimmed))
                || name.eq_ignore_ascii_case(trimmed)
        })
        .map(|(code, _)| *code)
}

/// 去掉 ZIP code，例如 "TX 78701" -> "TX"
fn strip_postal_code(value: &str) -> String {
    value
        .split_whitespace()
        .take_while(|token| !token.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_fragment(value: &str) -> String {
    let without_noise = noise_pattern().replace_all(value, " ");
    let without_brackets: String = without_noise
        .chars()
        .map(|c| if matches!(c, '(' | ')' | '[' | ']') { ' ' } else { c })
        .collect();
    collapse_whitespace(&without_brackets)
        .trim_matches(|c: char| c == '-' || c == '–' || c == ',' || c == '/' || c.is_whitespace())
        .to_string()
}

fn parse_place(fragment: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<String> = fragment
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    match parts.as_slice() {
        [] => (None, None),
        [single] => {
            if let Some(code) = resolve_state(&strip_postal_code(single)) {
                return (None, Some(code.to_string()));
            }
            // "Austin TX" 這種沒有逗號的寫法
            let tokens: Vec<&str> = single.split_whitespace().collect();
            if tokens.len() >= 2 {
                if let Some(code) = resolve_state(tokens[tokens.len() - 1]) {
                    let city = tokens[..tokens.len() - 1].join(" ");
                    return (Some(city), Some(code.to_string()));
                }
            }
            (Some(single.clone()), None)
        }
        [city, rest @ ..] => {
            let state = rest
                .iter()
                .find_map(|p| resolve_state(&strip_postal_code(p)));
            match state {
                Some(code) => (Some(city.clone()), Some(code.to_string())),
                None => match resolve_state(city) {
                    Some(code) => (None, Some(code.to_string())),
                    None => (Some(city.clone()), None),
                },
            }
        }
    }
}

pub fn parse_location(raw: Option<&str>) -> ParsedLocation {
    let text = match raw.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => {
            return ParsedLocation {
                display: NOT_SPECIFIED.to_string(),
                ..ParsedLocation::default()
            }
        }
    };

    let is_remote = remote_pattern().is_match(text);
    let is_hybrid = hybrid_pattern().is_match(text);

    let fragments: Vec<String> = multi_separator()
        .split(text)
        .map(clean_fragment)
        .filter(|f| !f.is_empty())
        .collect();
    let is_multiple = fragments.len() > 1 || text.to_lowercase().contains("multiple locations");

    let (city, state_code) = fragments
        .first()
        .filter(|f| !f.eq_ignore_ascii_case("multiple locations"))
        .map(|f| parse_place(f))
        .unwrap_or((None, None));

    let place = match (&city, &state_code) {
        (Some(c), Some(s)) => Some(format!("{}, {}", c, s)),
        (None, Some(s)) => Some(s.clone()),
        (Some(c), None) => Some(c.clone()),
        (None, None) => None,
    };

    let mut display = match (is_remote, place) {
        (true, Some(p)) => format!("Remote - {}", p),
        (true, None) => "Remote".to_string(),
        (false, Some(p)) => p,
        (false, None) => text.to_string(),
    };
    if is_hybrid {
        display.push_str(" (Hybrid)");
    }
    if is_multiple {
        display.push_str(" + more");
    }

    ParsedLocation {
        city,
        state_code,
        is_remote,
        is_hybrid,
        is_multiple,
        display,
    }
}
