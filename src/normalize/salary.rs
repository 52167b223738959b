use crate::domain::model::{ParsedSalary, SalaryPeriod};
use regex::Regex;
use std::sync::OnceLock;

const MIN_PLAUSIBLE_ANNUAL: f64 = 30_000.0;
const MAX_PLAUSIBLE_ANNUAL: f64 = 500_000.0;
// 沒有週期關鍵字時的判斷門檻
const HOURLY_CEILING: f64 = 500.0;
const ANNUAL_FLOOR: f64 = 10_000.0;

fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\$?\s*(\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)\s*(k\b)?").expect("valid regex")
    })
}

fn hourly_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(hour|\bhr\b|/\s*hr|hrly|\bph\b|p/h)").expect("valid regex"))
}

fn weekly_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(week|/\s*wk\b)").expect("valid regex"))
}

fn monthly_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(month|/\s*mo\b)").expect("valid regex"))
}

fn annual_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(year|annual|\byr\b|/\s*yr)").expect("valid regex"))
}

/// Period named in free text, if any. Hourly wins when several appear.
pub fn detect_period(text: &str) -> Option<SalaryPeriod> {
    if hourly_pattern().is_match(text) {
        Some(SalaryPeriod::Hourly)
    } else if weekly_pattern().is_match(text) {
        Some(SalaryPeriod::Weekly)
    } else if monthly_pattern().is_match(text) {
        Some(SalaryPeriod::Monthly)
    } else if annual_pattern().is_match(text) {
        Some(SalaryPeriod::Annual)
    } else {
        None
    }
}

fn infer_period(max_value: f64) -> Option<SalaryPeriod> {
    if max_value < HOURLY_CEILING {
        Some(SalaryPeriod::Hourly)
    } else if max_value >= ANNUAL_FLOOR {
        Some(SalaryPeriod::Annual)
    } else {
        None
    }
}

/// Build a salary from numeric bounds. Bounds are reordered when swapped.
pub fn salary_from_range(
    min: Option<f64>,
    max: Option<f64>,
    period: Option<SalaryPeriod>,
) -> Option<ParsedSalary> {
    let (low, high) = match (min, max) {
        (Some(a), Some(b)) => (a.min(b), a.max(b)),
        (Some(a), None) | (None, Some(a)) => (a, a),
        (None, None) => return None,
    };

    if !low.is_finite() || !high.is_finite() || low <= 0.0 {
        return None;
    }

    let period = period.or_else(|| infer_period(high))?;
    let multiplier = period.annual_multiplier();
    let annual_min = low * multiplier;
    let annual_max = high * multiplier;

    if annual_min < MIN_PLAUSIBLE_ANNUAL || annual_max > MAX_PLAUSIBLE_ANNUAL {
        tracing::debug!(
            "Dropping implausible salary {}-{} ({:?}) -> {}-{}",
            low,
            high,
            period,
            annual_min,
            annual_max
        );
        return None;
    }

    Some(ParsedSalary {
        min: low,
        max: high,
        period,
        annual_min: annual_min.round() as i64,
        annual_max: annual_max.round() as i64,
    })
}

/// Parse strings such as `$120,000 - $150,000 a year`, `$65/hr` or `120k-150k`.
pub fn parse_salary_text(text: &str) -> Option<ParsedSalary> {
    let amounts: Vec<f64> = amount_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let digits = caps.get(1)?.as_str().replace(',', "");
            let value: f64 = digits.parse().ok()?;
            Some(if caps.get(2).is_some() { value * 1000.0 } else { value })
        })
        .filter(|v| *v > 0.0)
        .take(2)
        .collect();

    let min = amounts.first().copied();
    let max = amounts.get(1).copied().or(min);
    salary_from_range(min, max, detect_period(text))
}

/// Structured numeric bounds take precedence over free text.
pub fn resolve_salary(
    min: Option<f64>,
    max: Option<f64>,
    period: Option<SalaryPeriod>,
    text: Option<&str>,
) -> Option<ParsedSalary> {
    if min.is_some() || max.is_some() {
        if let Some(salary) = salary_from_range(min, max, period) {
            return Some(salary);
        }
    }

    text.filter(|t| !t.trim().is_empty())
        .and_then(parse_salary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annual_range() {
        let salary = parse_salary_text("$120,000 - $150,000 a year").unwrap();
        assert_eq!(salary.period, SalaryPeriod::Annual);
        assert_eq!(salary.annual_min, 120_000);
        assert_eq!(salary.annual_max, 150_000);
    }

    #[test]
    fn test_hourly_single_value() {
        let salary = parse_salary_text("$65/hr").unwrap();
        assert_eq!(salary.period, SalaryPeriod::Hourly);
        assert_eq!(salary.min, 65.0);
        assert_eq!(salary.max, 65.0);
        assert_eq!(salary.annual_min, 135_200);
    }

    #[test]
    fn test_hourly_range_keyword() {
        let salary = parse_salary_text("60-75 per hour").unwrap();
        assert_eq!(salary.period, SalaryPeriod::Hourly);
        assert_eq!(salary.annual_min, 124_800);
        assert_eq!(salary.annual_max, 156_000);
    }

    #[test]
    fn test_k_suffix_infers_annual() {
        let salary = parse_salary_text("120k-150k").unwrap();
        assert_eq!(salary.period, SalaryPeriod::Annual);
        assert_eq!(salary.annual_min, 120_000);
        assert_eq!(salary.annual_max, 150_000);
    }

    #[test]
    fn test_monthly() {
        let salary = parse_salary_text("$9,500/month").unwrap();
        assert_eq!(salary.period, SalaryPeriod::Monthly);
        assert_eq!(salary.annual_min, 114_000);
    }

    #[test]
    fn test_weekly() {
        let salary = parse_salary_text("$2,600 - $3,000 per week").unwrap();
        assert_eq!(salary.period, SalaryPeriod::Weekly);
        assert_eq!(salary.annual_min, 135_200);
        assert_eq!(salary.annual_max, 156_000);

        let short = parse_salary_text("$2,800/wk").unwrap();
        assert_eq!(short.period, SalaryPeriod::Weekly);
        assert_eq!(short.annual_min, 145_600);
    }

    #[test]
    fn test_bare_small_numbers_are_hourly() {
        let salary = parse_salary_text("$70 - $85").unwrap();
        assert_eq!(salary.period, SalaryPeriod::Hourly);
    }

    #[test]
    fn test_ambiguous_and_implausible_dropped() {
        // 2,500 沒有週期關鍵字，無法判斷
        assert!(parse_salary_text("$2,500").is_none());
        // 時薪 450 換算成年薪超出合理範圍
        assert!(parse_salary_text("$450 per hour").is_none());
        assert!(parse_salary_text("$12 per hour").is_none());
        assert!(parse_salary_text("Competitive pay").is_none());
    }

    #[test]
    fn test_swapped_bounds_reordered() {
        let salary = salary_from_range(Some(150_000.0), Some(120_000.0), None).unwrap();
        assert_eq!(salary.min, 120_000.0);
        assert_eq!(salary.max, 150_000.0);
    }

    #[test]
    fn test_numeric_bounds_win_over_text() {
        let salary = resolve_salary(
            Some(55.0),
            Some(70.0),
            Some(SalaryPeriod::Hourly),
            Some("$200,000 a year"),
        )
        .unwrap();
        assert_eq!(salary.period, SalaryPeriod::Hourly);
        assert_eq!(salary.annual_min, 114_400);

        let from_text = resolve_salary(None, None, None, Some("$140,000 a year")).unwrap();
        assert_eq!(from_text.annual_min, 140_000);
    }
}
