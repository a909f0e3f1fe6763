//! Relative time expressions and the absolute window they resolve to.

use std::sync::LazyLock;

use chrono::{NaiveDateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{AnalyzerError, Result};
use crate::models::TimeWindow;

/// Literals that mean "no offset" without going through the token grammar.
const ZERO_LITERALS: &[&str] = &["now", "0", "0h", "0m", "0s"];

static DELTA_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*([wdhms])").expect("regex is valid"));

// ── Relative expressions ──────────────────────────────────────────────────────

/// Parse a relative time expression into a duration.
///
/// The expression is a run of `<integer><unit>` tokens with units
/// `w`, `d`, `h`, `m`, `s`. Tokens are summed, so order does not matter and a
/// repeated unit simply adds up.
///
/// ```
/// use chrono::TimeDelta;
/// use cpelog_core::time_window::parse_relative_delta;
///
/// assert_eq!(parse_relative_delta("3h30m").unwrap(), TimeDelta::minutes(210));
/// assert_eq!(parse_relative_delta("1w2d").unwrap(), TimeDelta::days(9));
/// assert_eq!(parse_relative_delta("now").unwrap(), TimeDelta::zero());
/// assert!(parse_relative_delta("xyz").is_err());
/// ```
pub fn parse_relative_delta(expr: &str) -> Result<TimeDelta> {
    let normalised = expr.trim().to_lowercase();
    if ZERO_LITERALS.contains(&normalised.as_str()) {
        return Ok(TimeDelta::zero());
    }

    let invalid = || AnalyzerError::InvalidRelativeTime(normalised.clone());

    let mut total = TimeDelta::zero();
    let mut found = false;
    for cap in DELTA_TOKEN.captures_iter(&normalised) {
        found = true;
        let value: i64 = cap[1].parse().map_err(|_| invalid())?;
        let part = match &cap[2] {
            "w" => TimeDelta::try_weeks(value),
            "d" => TimeDelta::try_days(value),
            "h" => TimeDelta::try_hours(value),
            "m" => TimeDelta::try_minutes(value),
            _ => TimeDelta::try_seconds(value),
        }
        .ok_or_else(invalid)?;
        total = total.checked_add(&part).ok_or_else(invalid)?;
    }

    if !found {
        return Err(invalid());
    }
    Ok(total)
}

/// Resolve `since`/`until` expressions against `now`.
///
/// `until = now + until_expr`, `since = now - since_expr`. A missing or blank
/// `since_expr` leaves the window unbounded in the past.
///
/// # Errors
///
/// [`AnalyzerError::InvalidRelativeTime`] for an unparsable expression and
/// [`AnalyzerError::InvalidTimeWindow`] when the start ends up after the end.
pub fn resolve(since_expr: Option<&str>, until_expr: &str, now: NaiveDateTime) -> Result<TimeWindow> {
    let until_delta = parse_relative_delta(until_expr)?;
    let until = now
        .checked_add_signed(until_delta)
        .ok_or_else(|| AnalyzerError::InvalidRelativeTime(until_expr.to_string()))?;

    let since = match since_expr.map(str::trim).filter(|s| !s.is_empty()) {
        Some(expr) => {
            let delta = parse_relative_delta(expr)?;
            Some(
                now.checked_sub_signed(delta)
                    .ok_or_else(|| AnalyzerError::InvalidRelativeTime(expr.to_string()))?,
            )
        }
        None => None,
    };

    if let Some(since) = since {
        if since > until {
            return Err(AnalyzerError::InvalidTimeWindow {
                since: since.to_string(),
                until: until.to_string(),
            });
        }
    }

    debug!("Resolved time window: since={:?} until={}", since, until);
    Ok(TimeWindow { since, until })
}

// ── Anchoring "now" ───────────────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Current wall-clock time in `tz_name`, without offset information.
///
/// Log timestamps carry no zone, so "now" must be expressed the same way.
/// `"auto"` uses the system zone; an unknown name falls back to UTC with a
/// warning.
pub fn now_in_timezone(tz_name: &str) -> NaiveDateTime {
    let name = if tz_name == "auto" {
        get_system_timezone()
    } else {
        tz_name.to_string()
    };
    let tz = name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", name);
        Tz::UTC
    });
    Utc::now().with_timezone(&tz).naive_local()
}

/// Validate that `tz_name` is `"auto"` or a recognised IANA timezone identifier.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name == "auto" || tz_name.parse::<Tz>().is_ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 0)
            .unwrap()
    }

    // ── parse_relative_delta ──────────────────────────────────────────────────

    #[test]
    fn test_zero_literals() {
        for expr in ["now", "0", "0h", "0m", "0s", " NOW ", "0H"] {
            assert_eq!(parse_relative_delta(expr).unwrap(), TimeDelta::zero(), "{expr}");
        }
    }

    #[test]
    fn test_single_units() {
        assert_eq!(parse_relative_delta("24h").unwrap(), TimeDelta::hours(24));
        assert_eq!(parse_relative_delta("2d").unwrap(), TimeDelta::days(2));
        assert_eq!(parse_relative_delta("1w").unwrap(), TimeDelta::weeks(1));
        assert_eq!(parse_relative_delta("90m").unwrap(), TimeDelta::minutes(90));
        assert_eq!(parse_relative_delta("45s").unwrap(), TimeDelta::seconds(45));
    }

    #[test]
    fn test_compound_expression() {
        let expected = TimeDelta::hours(48) + TimeDelta::minutes(15) + TimeDelta::seconds(10);
        assert_eq!(parse_relative_delta("48h15m10s").unwrap(), expected);
        assert_eq!(
            parse_relative_delta("2d6h").unwrap(),
            TimeDelta::days(2) + TimeDelta::hours(6)
        );
    }

    #[test]
    fn test_token_order_is_irrelevant() {
        assert_eq!(
            parse_relative_delta("1d2h").unwrap(),
            parse_relative_delta("2h1d").unwrap()
        );
    }

    #[test]
    fn test_duplicate_units_add_up() {
        assert_eq!(parse_relative_delta("1h1h").unwrap(), TimeDelta::hours(2));
    }

    #[test]
    fn test_whitespace_between_number_and_unit() {
        assert_eq!(parse_relative_delta("3 h").unwrap(), TimeDelta::hours(3));
    }

    #[test]
    fn test_invalid_expressions() {
        for expr in ["xyz", "", "12", "h", "-"] {
            let err = parse_relative_delta(expr).unwrap_err();
            assert!(
                matches!(err, AnalyzerError::InvalidRelativeTime(_)),
                "{expr} should be rejected"
            );
        }
    }

    #[test]
    fn test_overflowing_value_is_rejected() {
        assert!(parse_relative_delta("99999999999999999999w").is_err());
        assert!(parse_relative_delta("9999999999999w").is_err());
    }

    // ── resolve ───────────────────────────────────────────────────────────────

    #[test]
    fn test_resolve_last_24_hours() {
        let window = resolve(Some("24h"), "0h", now()).unwrap();
        assert_eq!(window.since, Some(now() - TimeDelta::hours(24)));
        assert_eq!(window.until, now());
    }

    #[test]
    fn test_resolve_without_since_is_unbounded() {
        let window = resolve(None, "now", now()).unwrap();
        assert!(window.since.is_none());
        assert_eq!(window.until, now());
    }

    #[test]
    fn test_resolve_blank_since_is_unbounded() {
        let window = resolve(Some("  "), "0h", now()).unwrap();
        assert!(window.since.is_none());
    }

    #[test]
    fn test_resolve_until_moves_forward() {
        let window = resolve(Some("1d"), "2h", now()).unwrap();
        assert_eq!(window.until, now() + TimeDelta::hours(2));
    }

    #[test]
    fn test_resolve_zero_width_window_is_allowed() {
        let window = resolve(Some("0h"), "0h", now()).unwrap();
        assert_eq!(window.since, Some(window.until));
    }

    #[test]
    fn test_resolve_invalid_expression() {
        assert!(matches!(
            resolve(Some("yesterday"), "0h", now()),
            Err(AnalyzerError::InvalidRelativeTime(_))
        ));
        assert!(matches!(
            resolve(None, "later", now()),
            Err(AnalyzerError::InvalidRelativeTime(_))
        ));
    }

    // ── timezone helpers ──────────────────────────────────────────────────────

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("auto"));
        assert!(validate_timezone("Europe/Berlin"));
        assert!(validate_timezone("UTC"));
        assert!(!validate_timezone("Mars/Olympus"));
    }

    #[test]
    fn test_now_in_timezone_utc_tracks_clock() {
        let before = Utc::now().naive_utc();
        let now = now_in_timezone("UTC");
        let after = Utc::now().naive_utc();
        assert!(now >= before && now <= after);
    }

    #[test]
    fn test_now_in_unknown_timezone_falls_back_to_utc() {
        let before = Utc::now().naive_utc();
        let now = now_in_timezone("Not/AZone");
        assert!(now >= before);
    }
}
