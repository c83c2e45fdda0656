// Field resolution - maps loosely shaped records onto the three fields
// the aggregator needs: temporal key, category and magnitude.
//
// Every lookup goes through a static candidate table and takes the first
// field that is present (non-null). A present but unusable field does not
// fall through to the next candidate of the same table.
use super::record::RawRecord;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde_json::Value;

pub const YEAR_FIELDS: &[&str] = &["year", "reporting_year", "fiscal_year"];
pub const MONTH_FIELDS: &[&str] = &["month", "reporting_month"];
pub const DATE_FIELDS: &[&str] = &[
    "date",
    "recorded_at",
    "start_date",
    "metric_date",
    "period_start",
    "created_at",
    "timestamp",
];
pub const SCOPE_FIELDS: &[&str] = &["scope", "scope_label", "emission_scope"];
pub const ACTIVITY_FIELDS: &[&str] = &[
    "activity",
    "activity_name",
    "material",
    "source",
    "section",
];
pub const MAGNITUDE_FIELDS: &[&str] = &[
    "total",
    "total_emission",
    "emission",
    "emissions",
    "ghg_emission",
    "co2e",
];
pub const METRIC_VALUE_FIELDS: &[&str] = &["value", "metric_value", "amount"];

const MIN_YEAR: i64 = 1;
const MAX_YEAR: i64 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Year,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryAxis {
    Scope,
    Activity,
}

impl CategoryAxis {
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            CategoryAxis::Scope => SCOPE_FIELDS,
            CategoryAxis::Activity => ACTIVITY_FIELDS,
        }
    }
}

/// Temporal information recovered from a single date-like value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    YearMonth(i32, u32),
    /// Best-effort year only; never carries a month.
    Year(i32),
}

impl DatePart {
    fn year(self) -> i32 {
        match self {
            DatePart::YearMonth(year, _) | DatePart::Year(year) => year,
        }
    }
}

pub fn format_year(year: i32) -> String {
    format!("{:04}", year)
}

pub fn format_year_month(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// Resolves the year (`YYYY`) or year-month (`YYYY-MM`) key of a record.
///
/// Precedence: explicit year field, then year + month fields (month
/// granularity only), then a generic date field. `None` means the record
/// has no usable temporal key and must be dropped.
pub fn resolve_temporal_key(record: &RawRecord, granularity: Granularity) -> Option<String> {
    let year = record.first_of(YEAR_FIELDS).and_then(|(_, v)| parse_year(v));
    let date = record.first_of(DATE_FIELDS).and_then(|(_, v)| parse_date_like(v));

    match granularity {
        Granularity::Year => year.or_else(|| date.map(DatePart::year)).map(format_year),
        Granularity::Month => {
            let month = record.first_of(MONTH_FIELDS).and_then(|(_, v)| parse_month(v));
            if let (Some(year), Some(month)) = (year, month) {
                return Some(format_year_month(year, month));
            }
            match date {
                Some(DatePart::YearMonth(year, month)) => Some(format_year_month(year, month)),
                _ => None,
            }
        }
    }
}

/// Resolves the scope label or activity name of a record.
///
/// Scope labels are normalized so that `"Scope 1"`, `"scope_1"` and `1`
/// all land in the same `scope1` bucket. Activity names are only trimmed.
pub fn resolve_category(record: &RawRecord, axis: CategoryAxis) -> Option<String> {
    let (_, value) = record.first_of(axis.candidates())?;
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if raw.is_empty() {
        return None;
    }

    match axis {
        CategoryAxis::Scope => normalize_scope(&raw),
        CategoryAxis::Activity => Some(raw),
    }
}

fn normalize_scope(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();

    if compact.is_empty() {
        None
    } else if compact.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("scope{}", compact))
    } else {
        Some(compact)
    }
}

/// Magnitude of an emission record; `0` when no candidate resolves.
pub fn resolve_magnitude(record: &RawRecord) -> f64 {
    resolve_number(record, MAGNITUDE_FIELDS)
}

pub fn resolve_number(record: &RawRecord, candidates: &[&'static str]) -> f64 {
    record
        .first_of(candidates)
        .map(|(_, v)| coerce_magnitude(v))
        .unwrap_or(0.0)
}

/// Total coercion of an arbitrary JSON value into a magnitude.
///
/// Numbers and numeric strings (surrounding whitespace allowed) map to
/// themselves. Everything else, including NaN, infinities and negative
/// values, maps to exactly `0.0`. The result is always finite and `>= 0`.
pub fn coerce_magnitude(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(x) if x.is_finite() && x > 0.0 => x,
        _ => 0.0,
    }
}

/// Parses an explicit year field: an integral number or a 4-digit string.
pub fn parse_year(value: &Value) -> Option<i32> {
    let year = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 {
                    return None;
                }
                f as i64
            }
        },
        Value::String(s) => {
            let s = s.trim();
            if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            s.parse::<i64>().ok()?
        }
        _ => return None,
    };

    (MIN_YEAR..=MAX_YEAR).contains(&year).then_some(year as i32)
}

/// Parses a month field in `1..=12`, numeric or string.
pub fn parse_month(value: &Value) -> Option<u32> {
    let month = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };

    (1..=12).contains(&month).then_some(month as u32)
}

/// Parses a generic date-like value.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM` and epoch milliseconds. Integers inside the year range are
/// read as a bare year. An unparseable string falls back to its first
/// four characters as a year when they are all digits.
pub fn parse_date_like(value: &Value) -> Option<DatePart> {
    let part = match value {
        Value::Number(n) => {
            let raw = n.as_i64()?;
            if (MIN_YEAR..=MAX_YEAR).contains(&raw) {
                return Some(DatePart::Year(raw as i32));
            }
            let dt = DateTime::from_timestamp_millis(raw)?;
            Some(DatePart::YearMonth(dt.year(), dt.month()))
        }
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    };

    // dates outside the year range never produce a key
    part.filter(|p| (MIN_YEAR..=MAX_YEAR).contains(&(p.year() as i64)))
}

fn parse_date_str(s: &str) -> Option<DatePart> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(DatePart::YearMonth(dt.year(), dt.month()));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(DatePart::YearMonth(dt.year(), dt.month()));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(DatePart::YearMonth(d.year(), d.month()));
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
        return Some(DatePart::YearMonth(d.year(), d.month()));
    }

    let prefix = s.get(..4)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse::<i32>().ok().map(DatePart::Year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        RawRecord::from(value)
    }

    #[test]
    fn test_year_field_wins_over_date() {
        let r = record(json!({"year": 2022, "date": "2019-05-01"}));
        assert_eq!(resolve_temporal_key(&r, Granularity::Year).as_deref(), Some("2022"));
    }

    #[test]
    fn test_year_from_four_digit_string() {
        let r = record(json!({"year": " 2021 "}));
        assert_eq!(resolve_temporal_key(&r, Granularity::Year).as_deref(), Some("2021"));

        let r = record(json!({"year": 2021.0}));
        assert_eq!(resolve_temporal_key(&r, Granularity::Year).as_deref(), Some("2021"));
    }

    #[test]
    fn test_unusable_year_falls_back_to_date() {
        let r = record(json!({"year": "FY21", "start_date": "2021-04-01"}));
        assert_eq!(resolve_temporal_key(&r, Granularity::Year).as_deref(), Some("2021"));
    }

    #[test]
    fn test_unparseable_year_without_date_is_unresolved() {
        let r = record(json!({"year": "twenty", "scope": "scope1", "total": 5}));
        assert_eq!(resolve_temporal_key(&r, Granularity::Year), None);
        assert_eq!(resolve_temporal_key(&r, Granularity::Month), None);
    }

    #[test]
    fn test_month_from_year_and_month_fields() {
        let r = record(json!({"year": 2024, "month": 3}));
        assert_eq!(resolve_temporal_key(&r, Granularity::Month).as_deref(), Some("2024-03"));

        let r = record(json!({"year": "2024", "month": "11"}));
        assert_eq!(resolve_temporal_key(&r, Granularity::Month).as_deref(), Some("2024-11"));
    }

    #[test]
    fn test_year_granularity_never_needs_month() {
        let r = record(json!({"year": 2024, "month": 13}));
        assert_eq!(resolve_temporal_key(&r, Granularity::Year).as_deref(), Some("2024"));
        assert_eq!(resolve_temporal_key(&r, Granularity::Month), None);
    }

    #[test]
    fn test_month_from_date_field() {
        let r = record(json!({"recorded_at": "2023-07-14T09:30:00Z"}));
        assert_eq!(resolve_temporal_key(&r, Granularity::Month).as_deref(), Some("2023-07"));

        let r = record(json!({"year": 2023, "date": "2023-02"}));
        assert_eq!(resolve_temporal_key(&r, Granularity::Month).as_deref(), Some("2023-02"));
    }

    #[test]
    fn test_unparseable_date_yields_year_only() {
        let r = record(json!({"date": "2020/13/45 garbage"}));
        assert_eq!(resolve_temporal_key(&r, Granularity::Year).as_deref(), Some("2020"));
        assert_eq!(resolve_temporal_key(&r, Granularity::Month), None);

        let r = record(json!({"date": "Q3 2020"}));
        assert_eq!(resolve_temporal_key(&r, Granularity::Year), None);
    }

    #[test]
    fn test_parse_date_like_variants() {
        assert_eq!(
            parse_date_like(&json!("2022-01-31 23:59:59")),
            Some(DatePart::YearMonth(2022, 1))
        );
        assert_eq!(parse_date_like(&json!("2022-12-01")), Some(DatePart::YearMonth(2022, 12)));
        assert_eq!(parse_date_like(&json!(2019)), Some(DatePart::Year(2019)));
        // 2021-03-01T00:00:00Z
        assert_eq!(
            parse_date_like(&json!(1_614_556_800_000_i64)),
            Some(DatePart::YearMonth(2021, 3))
        );
        assert_eq!(parse_date_like(&json!(true)), None);
    }

    #[test]
    fn test_out_of_range_dates_are_unresolved() {
        for raw in [
            json!("0000-06-01"),
            json!("-0001-06-01"),
            json!(-62_200_000_000_000_i64),
        ] {
            assert_eq!(parse_date_like(&raw), None, "{}", raw);

            let r = record(json!({ "date": raw }));
            assert_eq!(resolve_temporal_key(&r, Granularity::Year), None);
            assert_eq!(resolve_temporal_key(&r, Granularity::Month), None);
        }
    }

    #[test]
    fn test_scope_normalization() {
        for raw in [json!("Scope 1"), json!("scope_1"), json!("SCOPE1"), json!(1), json!("1")] {
            let r = record(json!({ "scope": raw }));
            assert_eq!(resolve_category(&r, CategoryAxis::Scope).as_deref(), Some("scope1"));
        }
    }

    #[test]
    fn test_category_priority_and_absence() {
        let r = record(json!({"material": "Diesel", "section": "Fleet"}));
        assert_eq!(resolve_category(&r, CategoryAxis::Activity).as_deref(), Some("Diesel"));

        let r = record(json!({"activity": "   "}));
        assert_eq!(resolve_category(&r, CategoryAxis::Activity), None);

        let r = record(json!({"total": 3}));
        assert_eq!(resolve_category(&r, CategoryAxis::Scope), None);
    }

    #[test]
    fn test_coerce_magnitude_is_total() {
        assert_eq!(coerce_magnitude(&json!(12.5)), 12.5);
        assert_eq!(coerce_magnitude(&json!(" 40 ")), 40.0);
        assert_eq!(coerce_magnitude(&json!("abc")), 0.0);
        assert_eq!(coerce_magnitude(&json!("NaN")), 0.0);
        assert_eq!(coerce_magnitude(&json!("inf")), 0.0);
        assert_eq!(coerce_magnitude(&json!(-3)), 0.0);
        assert_eq!(coerce_magnitude(&json!("1,000")), 0.0);
        assert_eq!(coerce_magnitude(&json!(null)), 0.0);
        assert_eq!(coerce_magnitude(&json!({"v": 1})), 0.0);
    }

    #[test]
    fn test_magnitude_takes_first_present_field() {
        let r = record(json!({"total": null, "total_emission": "7.5", "ghg_emission": 99}));
        assert_eq!(resolve_magnitude(&r), 7.5);

        let r = record(json!({"year": 2023, "scope": "scope2"}));
        assert_eq!(resolve_magnitude(&r), 0.0);
    }
}
