//! Time expressions and time windows.
//!
//! A time expression is either relative to now (`90m`, `24h`, `7d`) or an
//! absolute RFC3339 timestamp. Relative expressions always point into the
//! past: `24h` means "24 hours ago".

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::error::{Result, WatchError};

const ACCEPTED_FORMS: &str =
    "expected a relative duration (e.g. 30m, 24h, 7d) or an RFC3339 timestamp (e.g. 2024-01-15T00:00:00Z)";

/// Parses a time expression relative to `now`.
///
/// Returns `Ok(None)` for an empty expression, meaning "no bound".
///
/// # Errors
///
/// Returns [`WatchError::InvalidTimeExpr`] when the expression is neither a
/// non-negative relative duration nor an RFC3339 timestamp.
pub fn parse_time_expr(input: &str, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
    let expr = input.trim();
    if expr.is_empty() {
        return Ok(None);
    }

    if let Some(count) = expr.strip_suffix('d') {
        return parse_days(input, count, now).map(Some);
    }

    if let Some(ago) = parse_go_duration(input, expr)? {
        return now
            .checked_sub_signed(ago)
            .map(Some)
            .ok_or_else(|| invalid(input, "duration reaches before the supported time range"));
    }

    DateTime::parse_from_rfc3339(expr)
        .map(|ts| Some(ts.with_timezone(&Utc)))
        .map_err(|_| invalid(input, ACCEPTED_FORMS))
}

fn parse_days(input: &str, count: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let days: i64 = count
        .parse()
        .map_err(|_| invalid(input, "day count must be a whole number, e.g. 7d"))?;
    if days < 0 {
        return Err(invalid(input, "negative durations are not allowed"));
    }
    ChronoDuration::try_days(days)
        .and_then(|ago| now.checked_sub_signed(ago))
        .ok_or_else(|| invalid(input, "day count is too large"))
}

/// Parses a Go-style duration (`300ms`, `1h30m`, `1.5h`).
///
/// Returns `Ok(None)` when the expression is not shaped like a duration so
/// the caller can try the timestamp form.
fn parse_go_duration(input: &str, expr: &str) -> Result<Option<ChronoDuration>> {
    let (negative, body) = match expr.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, expr),
    };

    let shaped = body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && body
            .chars()
            .all(|c| is_number_char(c) || matches!(c, 'n' | 'u' | 'µ' | 'm' | 's' | 'h'));
    if !shaped {
        return Ok(None);
    }
    if negative {
        return Err(invalid(input, "negative durations are not allowed"));
    }

    let whole = expand_fractions(body)
        .ok_or_else(|| invalid(input, "malformed decimal term, expected e.g. 1.5h"))?;
    let std_duration = humantime::parse_duration(&whole).map_err(|e| invalid(input, &e.to_string()))?;
    ChronoDuration::from_std(std_duration)
        .map(Some)
        .map_err(|_| invalid(input, "duration is too large"))
}

const fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// Rewrites decimal terms as whole nanoseconds (`1.5h30m` becomes
/// `5400000000000ns30m`) so humantime only ever sees integers. Digits below
/// one nanosecond are truncated.
fn expand_fractions(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !is_number_char(c)).unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail.find(is_number_char).unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        match number.split_once('.') {
            None => out.push_str(number),
            Some((whole, fraction)) => {
                let nanos = fractional_nanos(whole, fraction, unit)?;
                out.push_str(&nanos.to_string());
                out.push_str("ns");
                rest = next;
                continue;
            }
        }
        out.push_str(unit);
        rest = next;
    }
    Some(out)
}

fn fractional_nanos(whole: &str, fraction: &str, unit: &str) -> Option<u64> {
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return None;
    }
    let scale: u64 = match unit {
        "ns" => 1,
        "us" | "µs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60_000_000_000,
        "h" => 3_600_000_000_000,
        _ => return None,
    };
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut total = whole.checked_mul(scale)?;
    let mut place = scale;
    for digit in fraction.chars() {
        place /= 10;
        total = total.checked_add(u64::from(digit.to_digit(10)?) * place)?;
    }
    Some(total)
}

fn invalid(input: &str, reason: &str) -> WatchError {
    WatchError::InvalidTimeExpr {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

/// A time range with optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub to: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// A window with neither bound.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { from: None, to: None }
    }

    /// Builds a window from resolved instants.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::InvalidWindow`] if both bounds are present and
    /// `from` is not strictly before `to`.
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(f), Some(t)) = (from, to) {
            if f >= t {
                return Err(WatchError::InvalidWindow {
                    from: f.to_rfc3339(),
                    to: t.to_rfc3339(),
                });
            }
        }
        Ok(Self { from, to })
    }

    /// Parses `--since`/`--until` style expressions into a window.
    ///
    /// Ordering errors echo the expressions exactly as the operator typed them.
    ///
    /// # Errors
    ///
    /// Returns an error if either expression is invalid or the bounds are out
    /// of order.
    pub fn parse(since: Option<&str>, until: Option<&str>, now: DateTime<Utc>) -> Result<Self> {
        let from = match since {
            Some(s) => parse_time_expr(s, now)?,
            None => None,
        };
        let to = match until {
            Some(s) => parse_time_expr(s, now)?,
            None => None,
        };

        Self::new(from, to).map_err(|err| match (err, since, until) {
            (WatchError::InvalidWindow { .. }, Some(s), Some(u)) => WatchError::InvalidWindow {
                from: s.trim().to_string(),
                to: u.trim().to_string(),
            },
            (other, _, _) => other,
        })
    }

    /// True if `instant` lies past the upper bound.
    #[must_use]
    pub fn is_after_end(&self, instant: DateTime<Utc>) -> bool {
        self.to.is_some_and(|to| instant > to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).single().expect("valid instant")
    }

    #[test]
    fn empty_is_no_bound() {
        assert_eq!(parse_time_expr("", now()).ok(), Some(None));
        assert_eq!(parse_time_expr("   ", now()).ok(), Some(None));
    }

    #[test_case("24h", 24 * 3600 ; "hours")]
    #[test_case("1d", 24 * 3600 ; "one day")]
    #[test_case("7d", 7 * 24 * 3600 ; "seven days")]
    #[test_case("0d", 0 ; "zero days")]
    #[test_case("90m", 90 * 60 ; "minutes")]
    #[test_case("1h30m", 90 * 60 ; "compound")]
    #[test_case("45s", 45 ; "seconds")]
    #[test_case("1.5h", 90 * 60 ; "fractional hours")]
    #[test_case("0.5h", 30 * 60 ; "half hour")]
    #[test_case(".5m", 30 ; "leading point")]
    #[test_case("1h0.5m", 3600 + 30 ; "compound fraction")]
    fn relative_expressions(expr: &str, seconds_ago: i64) {
        let parsed = parse_time_expr(expr, now()).expect("should parse");
        assert_eq!(parsed, Some(now() - ChronoDuration::seconds(seconds_ago)));
    }

    #[test]
    fn sub_second_units() {
        let parsed = parse_time_expr("1500ms", now()).expect("should parse");
        assert_eq!(parsed, Some(now() - ChronoDuration::milliseconds(1500)));
    }

    #[test]
    fn fractional_sub_second_units() {
        let parsed = parse_time_expr("2.25ms", now()).expect("should parse");
        assert_eq!(parsed, Some(now() - ChronoDuration::microseconds(2250)));
    }

    #[test]
    fn day_and_hour_forms_agree_against_wall_clock() {
        let wall = Utc::now();
        let day = parse_time_expr("1d", Utc::now()).expect("1d").expect("bound");
        let hours = parse_time_expr("24h", Utc::now()).expect("24h").expect("bound");
        let expected = wall - ChronoDuration::hours(24);
        assert!((day - expected).num_milliseconds().abs() < 50);
        assert!((hours - expected).num_milliseconds().abs() < 50);
    }

    #[test]
    fn absolute_timestamp() {
        let parsed = parse_time_expr("2024-01-15T00:00:00Z", now()).expect("should parse");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).single());
    }

    #[test]
    fn absolute_timestamp_with_offset() {
        let parsed = parse_time_expr("2024-01-15T02:00:00+02:00", now()).expect("should parse");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).single());
    }

    #[test_case("-7d", "negative" ; "negative days")]
    #[test_case("-2h", "negative" ; "negative hours")]
    #[test_case("1.5d", "whole number" ; "fractional days")]
    #[test_case("xd", "whole number" ; "non numeric days")]
    #[test_case("7days", "RFC3339" ; "unit word")]
    #[test_case("10min", "RFC3339" ; "minute word")]
    #[test_case("yesterday", "RFC3339" ; "free text")]
    #[test_case("2024-13-01T00:00:00Z", "RFC3339" ; "bad month")]
    #[test_case("30", "unit" ; "missing unit")]
    #[test_case("1.2.3h", "decimal" ; "two decimal points")]
    #[test_case("1.5", "decimal" ; "fraction without unit")]
    #[test_case("-1.5h", "negative" ; "negative fraction")]
    fn rejected_expressions(expr: &str, reason_fragment: &str) {
        let err = parse_time_expr(expr, now()).expect_err("should reject");
        let msg = err.to_string();
        assert!(msg.contains(expr), "message should echo input: {msg}");
        assert!(msg.contains(reason_fragment), "unexpected message: {msg}");
    }

    #[test]
    fn format_error_names_both_forms() {
        let msg = parse_time_expr("last tuesday", now()).expect_err("should reject").to_string();
        assert!(msg.contains("relative duration"));
        assert!(msg.contains("RFC3339"));
    }

    #[test]
    fn window_out_of_order_echoes_inputs() {
        let err = TimeWindow::parse(
            Some("2024-01-15T00:00:00Z"),
            Some("2024-01-10T00:00:00Z"),
            now(),
        )
        .expect_err("should reject");
        let msg = err.to_string();
        assert!(matches!(err, WatchError::InvalidWindow { .. }));
        assert!(msg.contains("2024-01-15T00:00:00Z"));
        assert!(msg.contains("2024-01-10T00:00:00Z"));
    }

    #[test]
    fn window_in_order_succeeds() {
        let window = TimeWindow::parse(
            Some("2024-01-10T00:00:00Z"),
            Some("2024-01-15T00:00:00Z"),
            now(),
        )
        .expect("should parse");
        assert_eq!(window.from, Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).single());
        assert_eq!(window.to, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).single());
    }

    #[test]
    fn window_equal_bounds_rejected() {
        let err = TimeWindow::parse(Some("1h"), Some("60m"), now()).expect_err("should reject");
        assert!(err.to_string().contains("--since 1h"));
    }

    #[test]
    fn window_relative_bounds() {
        let window = TimeWindow::parse(Some("2h"), Some("1h"), now()).expect("should parse");
        assert_eq!(window.from, Some(now() - ChronoDuration::hours(2)));
        assert_eq!(window.to, Some(now() - ChronoDuration::hours(1)));
    }

    #[test]
    fn window_single_bounds() {
        let window = TimeWindow::parse(None, Some(""), now()).expect("should parse");
        assert_eq!(window, TimeWindow::unbounded());

        let window = TimeWindow::parse(Some("1d"), None, now()).expect("should parse");
        assert!(window.from.is_some());
        assert!(window.to.is_none());
    }

    #[test]
    fn after_end() {
        let window = TimeWindow::new(None, Some(now())).expect("valid");
        assert!(window.is_after_end(now() + ChronoDuration::nanoseconds(1)));
        assert!(!window.is_after_end(now()));
        assert!(!TimeWindow::unbounded().is_after_end(now()));
    }
}
