//! Localised label dates.
//!
//! The preferred language is passed explicitly (for example the first entry
//! of an `Accept-Language` header). Only languages on [`ACCEPTED_LANGUAGES`]
//! are honoured; anything else falls back to the configured locale. Dates use
//! the medium style without a time part.
//!
//! Time zones are IANA names (`America/Santiago`) or fixed offsets
//! (`-03:00`, `UTC+5:30`).

use chrono::{DateTime, FixedOffset, Locale, Offset, Utc};
use chrono_tz::Tz;

/// Languages a caller preference may select.
pub const ACCEPTED_LANGUAGES: &[&str] = &["es"];

pub const DEFAULT_LOCALE: &str = "es_CL";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Format `timestamp` as a medium-style date.
///
/// `preferred` is matched on its first two characters against the
/// allow-list; `fallback` defaults to `es_CL`, `timezone` to UTC. Unknown
/// locales and time zones fall back silently; this never fails.
pub fn date_formatter(
    timestamp: &DateTime<Utc>,
    preferred: Option<&str>,
    fallback: Option<&str>,
    timezone: Option<&str>,
) -> String {
    let tag = select_locale(preferred, fallback.unwrap_or(DEFAULT_LOCALE));
    let zone = parse_timezone(timezone.unwrap_or(DEFAULT_TIMEZONE)).unwrap_or_else(|| {
        log::warn!("Unknown time zone {timezone:?}, using UTC");
        Zone::Fixed(utc())
    });

    let (locale, pattern) = medium_pattern(&tag);
    match zone {
        Zone::Named(tz) => timestamp
            .with_timezone(&tz)
            .format_localized(pattern, locale)
            .to_string(),
        Zone::Fixed(offset) => timestamp
            .with_timezone(&offset)
            .format_localized(pattern, locale)
            .to_string(),
    }
}

/// A parsed time zone setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// IANA database zone; daylight saving follows the date.
    Named(Tz),
    Fixed(FixedOffset),
}

/// The locale tag the allow-list selects for a preference.
pub fn select_locale(preferred: Option<&str>, fallback: &str) -> String {
    let lang: String = preferred
        .unwrap_or_default()
        .trim()
        .chars()
        .take(2)
        .collect::<String>()
        .to_ascii_lowercase();
    if ACCEPTED_LANGUAGES.contains(&lang.as_str()) {
        lang
    } else {
        fallback.to_string()
    }
}

fn medium_pattern(tag: &str) -> (Locale, &'static str) {
    let normalised = tag.replace('-', "_");
    match normalised.as_str() {
        "es" => (Locale::es_ES, "%-d %b %Y"),
        "es_CL" => (Locale::es_CL, "%d-%m-%Y"),
        t if t == "en" || t.starts_with("en_") => (
            Locale::try_from(t).unwrap_or(Locale::en_US),
            "%b %-d, %Y",
        ),
        t => match Locale::try_from(t) {
            Ok(locale) => (locale, "%x"),
            Err(_) => {
                log::warn!("Unknown locale {tag:?}, using {DEFAULT_LOCALE}");
                (Locale::es_CL, "%d-%m-%Y")
            }
        },
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parse an IANA zone name, or `UTC`, `Z`, `GMT`, `±HH:MM`, `±HHMM`, `±HH`
/// and `UTC±H[:MM]`.
pub fn parse_timezone(tz: &str) -> Option<Zone> {
    let tz = tz.trim();
    if let Ok(named) = tz.parse::<Tz>() {
        return Some(Zone::Named(named));
    }
    parse_offset(tz).map(Zone::Fixed)
}

fn parse_offset(tz: &str) -> Option<FixedOffset> {
    let upper = tz.to_ascii_uppercase();
    if matches!(upper.as_str(), "UTC" | "Z" | "GMT" | "ETC/UTC") {
        return Some(utc());
    }
    let offset = upper
        .strip_prefix("UTC")
        .or_else(|| upper.strip_prefix("GMT"))
        .unwrap_or(&upper);

    let (sign, rest) = match offset.as_bytes().first().copied()? {
        b'+' => (1, &offset[1..]),
        b'-' => (-1, &offset[1..]),
        _ => return None,
    };
    if !rest.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return None;
    }
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn default_locale_is_chilean_spanish() {
        assert_eq!(date_formatter(&sample(), None, None, None), "18-10-2026");
    }

    #[test]
    fn accepted_language_is_honoured() {
        assert_eq!(
            date_formatter(&sample(), Some("es-ES,es;q=0.9"), None, None),
            "18 oct 2026"
        );
    }

    #[test]
    fn unrecognised_preference_falls_back() {
        assert_eq!(
            date_formatter(&sample(), Some("fr-FR"), None, None),
            "18-10-2026"
        );
        assert_eq!(
            date_formatter(&sample(), Some("de"), Some("en_US"), None),
            "Oct 18, 2026"
        );
    }

    #[test]
    fn unknown_fallback_locale_never_errors() {
        assert_eq!(
            date_formatter(&sample(), None, Some("xx_YY"), None),
            "18-10-2026"
        );
    }

    #[test]
    fn timezone_shifts_the_calendar_day() {
        let late = Utc.with_ymd_and_hms(2026, 10, 18, 23, 30, 0).unwrap();
        assert_eq!(date_formatter(&late, None, None, Some("+03:00")), "19-10-2026");
        assert_eq!(date_formatter(&late, None, None, Some("Mars/Olympus")), "18-10-2026");
    }

    #[test]
    fn named_zone_follows_daylight_saving() {
        let early = Utc.with_ymd_and_hms(2026, 10, 18, 1, 30, 0).unwrap();
        assert_eq!(
            date_formatter(&early, None, None, Some("America/Santiago")),
            "17-10-2026"
        );
        assert_eq!(
            parse_timezone("America/Santiago"),
            Some(Zone::Named(chrono_tz::America::Santiago))
        );
    }

    #[test]
    fn timezone_forms() {
        let fixed = |secs: i32| FixedOffset::east_opt(secs).map(Zone::Fixed);
        assert_eq!(parse_timezone("+00:00"), fixed(0));
        assert_eq!(parse_timezone("-0400"), fixed(-4 * 3600));
        assert_eq!(parse_timezone("UTC+5:30"), fixed(5 * 3600 + 1800));
        assert_eq!(parse_timezone("-03"), fixed(-3 * 3600));
        assert_eq!(parse_timezone("Mars/Olympus"), None);
    }

    #[test]
    fn non_ascii_offset_is_rejected() {
        assert_eq!(parse_timezone("UTC+aé1"), None);
        assert_eq!(parse_timezone("+0é0"), None);
        let late = Utc.with_ymd_and_hms(2026, 10, 18, 23, 30, 0).unwrap();
        assert_eq!(date_formatter(&late, None, None, Some("UTC+aé1")), "18-10-2026");
    }
}
