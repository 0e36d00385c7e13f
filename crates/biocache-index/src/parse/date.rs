//! Date-range extractor over a fixed ordered list of format patterns.
//! Each pattern group is a total `TryParse`-style extractor — fall-through
//! instead of exceptions for control flow — that either returns a
//! complete `EventDate` or fails and is skipped; no exception ever
//! escapes `parse_date`.

use regex::Regex;
use std::sync::OnceLock;
use time::{Date, Month, OffsetDateTime, Time};

/// Parsed temporal envelope. Year-only and month-only forms
/// leave the corresponding day/month strings empty; `parsed_start_date`/
/// `parsed_end_date` always hold a complete instant (missing day/month
/// default to `01` for that purpose only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDate {
    pub parsed_start_date: OffsetDateTime,
    pub start_day: String,
    pub start_month: String,
    pub start_year: String,
    pub parsed_end_date: OffsetDateTime,
    pub end_day: String,
    pub end_month: String,
    pub end_year: String,
    pub single_date: bool,
}

const MONTHS: &[(&str, u8)] = &[
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

fn month_from_name(name: &str) -> Option<u8> {
    let lower = name.to_ascii_lowercase();
    let prefix = lower.get(0..3)?;
    MONTHS
        .iter()
        .find(|(abbrev, _)| *abbrev == prefix)
        .map(|(_, n)| *n)
}

fn make_date(year: i32, month: u8, day: u8) -> Option<Date> {
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

fn make_datetime(year: i32, month: u8, day: u8, hour: u8, min: u8, sec: u8) -> Option<OffsetDateTime> {
    let date = make_date(year, month, day)?;
    let time = Time::from_hms(hour, min, sec).ok()?;
    Some(date.with_time(time).assume_utc())
}

fn parse_int(s: &str) -> Option<i32> {
    s.parse().ok()
}

fn single(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    min: u8,
    sec: u8,
    day_str: String,
    month_str: String,
) -> Option<EventDate> {
    let parsed = make_datetime(year, month, day, hour, min, sec)?;
    let year_str = year.to_string();
    Some(EventDate {
        parsed_start_date: parsed,
        start_day: day_str.clone(),
        start_month: month_str.clone(),
        start_year: year_str.clone(),
        parsed_end_date: parsed,
        end_day: day_str,
        end_month: month_str,
        end_year: year_str,
        single_date: true,
    })
}

fn range(
    start_year: i32,
    start_month: u8,
    start_day: u8,
    start_day_str: String,
    start_month_str: String,
    end_year: i32,
    end_month: u8,
    end_day: u8,
    end_day_str: String,
    end_month_str: String,
) -> Option<EventDate> {
    let start = make_datetime(start_year, start_month, start_day, 0, 0, 0)?;
    let end = make_datetime(end_year, end_month, end_day, 0, 0, 0)?;
    Some(EventDate {
        parsed_start_date: start,
        start_day: start_day_str,
        start_month: start_month_str,
        start_year: start_year.to_string(),
        parsed_end_date: end,
        end_day: end_day_str,
        end_month: end_month_str,
        end_year: end_year.to_string(),
        single_date: false,
    })
}

fn regex_once(pattern: &'static str, cell: &'static OnceLock<Regex>) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static date pattern is valid regex"))
}

macro_rules! re {
    ($pattern:literal) => {{
        static CELL: OnceLock<Regex> = OnceLock::new();
        regex_once($pattern, &CELL)
    }};
}

/// Strips a fractional-seconds component from a full ISO date-time while
/// keeping any trailing zone designator, e.g.
/// `2007-03-01T13:00:00.123456Z` -> `2007-03-01T13:00:00Z`.
fn strip_subsecond(s: &str) -> String {
    let pattern = re!(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})\.\d+(Z|[+-]\d{2}:?\d{2})?$");
    if let Some(caps) = pattern.captures(s) {
        let mut out = caps[1].to_string();
        if let Some(zone) = caps.get(2) {
            out.push_str(zone.as_str());
        }
        out
    } else {
        s.to_string()
    }
}

/// Strips a trailing `Z` or `±HH:MM`/`±HHMM` offset designator; the offset
/// itself carries no information our `EventDate` retains.
fn strip_offset(s: &str) -> &str {
    let pattern = re!(r"^(.*?)(?:Z|[+-]\d{2}:?\d{2})$");
    match pattern.captures(s) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(s),
        None => s,
    }
}

fn try_iso_single_date(s: &str) -> Option<EventDate> {
    let pattern = re!(
        r"^(\d{4})[-/](\d{2})[-/](\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2}))?)?(?:Z|[+-]\d{2}:?\d{2})?$"
    );
    let caps = pattern.captures(s)?;
    let year = parse_int(&caps[1])?;
    let month: u8 = caps[2].parse().ok()?;
    let day: u8 = caps[3].parse().ok()?;
    let hour: u8 = caps.get(4).map(|m| m.as_str()).unwrap_or("0").parse().ok()?;
    let min: u8 = caps.get(5).map(|m| m.as_str()).unwrap_or("0").parse().ok()?;
    let sec: u8 = caps.get(6).map(|m| m.as_str()).unwrap_or("0").parse().ok()?;
    single(
        year,
        month,
        day,
        hour,
        min,
        sec,
        caps[3].to_string(),
        caps[2].to_string(),
    )
}

fn try_iso_single_year(s: &str) -> Option<EventDate> {
    let pattern = re!(r"^(\d{4})(?:-00-00)?$");
    let caps = pattern.captures(s)?;
    let year = parse_int(&caps[1])?;
    let parsed = make_datetime(year, 1, 1, 0, 0, 0)?;
    let year_str = year.to_string();
    Some(EventDate {
        parsed_start_date: parsed,
        start_day: String::new(),
        start_month: String::new(),
        start_year: year_str.clone(),
        parsed_end_date: parsed,
        end_day: String::new(),
        end_month: String::new(),
        end_year: year_str,
        single_date: true,
    })
}

fn try_iso_with_month_name_date(s: &str) -> Option<EventDate> {
    let pattern = re!(
        r"^(\d{4})-([A-Za-z]+)-(\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2}))?)?(?:Z|[+-]\d{2}:?\d{2})?$"
    );
    let caps = pattern.captures(s)?;
    let year = parse_int(&caps[1])?;
    let month = month_from_name(&caps[2])?;
    let day: u8 = caps[3].parse().ok()?;
    let hour: u8 = caps.get(4).map(|m| m.as_str()).unwrap_or("0").parse().ok()?;
    let min: u8 = caps.get(5).map(|m| m.as_str()).unwrap_or("0").parse().ok()?;
    let sec: u8 = caps.get(6).map(|m| m.as_str()).unwrap_or("0").parse().ok()?;
    single(
        year,
        month,
        day,
        hour,
        min,
        sec,
        caps[3].to_string(),
        format!("{month:02}"),
    )
}

fn try_iso_date_range(s: &str) -> Option<EventDate> {
    let (left, right) = s.split_once('/')?;
    let pattern = re!(r"^(\d{4})-(\d{2})-(\d{2})$");
    let l = pattern.captures(left)?;
    let r = pattern.captures(right)?;
    range(
        parse_int(&l[1])?,
        l[2].parse().ok()?,
        l[3].parse().ok()?,
        l[3].to_string(),
        l[2].to_string(),
        parse_int(&r[1])?,
        r[2].parse().ok()?,
        r[3].parse().ok()?,
        r[3].to_string(),
        r[2].to_string(),
    )
}

fn try_iso_day_date_range(s: &str) -> Option<EventDate> {
    let pattern = re!(r"^(\d{4})-(\d{2})-(\d{2})/(\d{2})$");
    let caps = pattern.captures(s)?;
    let year = parse_int(&caps[1])?;
    let month: u8 = caps[2].parse().ok()?;
    range(
        year,
        month,
        caps[3].parse().ok()?,
        caps[3].to_string(),
        caps[2].to_string(),
        year,
        month,
        caps[4].parse().ok()?,
        caps[4].to_string(),
        caps[2].to_string(),
    )
}

fn try_iso_day_month_range(s: &str) -> Option<EventDate> {
    let pattern = re!(r"^(\d{4})-(\d{2})-(\d{2})/(\d{2})-(\d{2})$");
    let caps = pattern.captures(s)?;
    let year = parse_int(&caps[1])?;
    range(
        year,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
        caps[3].to_string(),
        caps[2].to_string(),
        year,
        caps[4].parse().ok()?,
        caps[5].parse().ok()?,
        caps[5].to_string(),
        caps[4].to_string(),
    )
}

fn try_iso_date_time_range(s: &str) -> Option<EventDate> {
    let (left, right) = s.split_once('/')?;
    let pattern = re!(
        r"^(\d{4})-(\d{2})-(\d{2})[ T](\d{2}):(\d{2}):(\d{2})(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?$"
    );
    let l = pattern.captures(&strip_subsecond_loose(left))?;
    let r = pattern.captures(&strip_subsecond_loose(right))?;
    range(
        parse_int(&l[1])?,
        l[2].parse().ok()?,
        l[3].parse().ok()?,
        l[3].to_string(),
        l[2].to_string(),
        parse_int(&r[1])?,
        r[2].parse().ok()?,
        r[3].parse().ok()?,
        r[3].to_string(),
        r[2].to_string(),
    )
}

fn strip_subsecond_loose(s: &str) -> String {
    let pattern = re!(r"^(\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2})\.\d+$");
    match pattern.captures(s) {
        Some(caps) => caps[1].to_string(),
        None => s.to_string(),
    }
}

fn try_iso_month_date(s: &str) -> Option<EventDate> {
    if let Some(caps) = re!(r"^(\d{4})-(\d{2})(?:-00)?$").captures(s) {
        let year = parse_int(&caps[1])?;
        let month: u8 = caps[2].parse().ok()?;
        let parsed = make_datetime(year, month, 1, 0, 0, 0)?;
        let year_str = year.to_string();
        let month_str = caps[2].to_string();
        return Some(EventDate {
            parsed_start_date: parsed,
            start_day: String::new(),
            start_month: month_str.clone(),
            start_year: year_str.clone(),
            parsed_end_date: parsed,
            end_day: String::new(),
            end_month: month_str,
            end_year: year_str,
            single_date: true,
        });
    }
    if let Some(caps) = re!(r"^([A-Za-z]{3,})-(\d{4})$").captures(s) {
        let month = month_from_name(&caps[1])?;
        let year = parse_int(&caps[2])?;
        let parsed = make_datetime(year, month, 1, 0, 0, 0)?;
        let year_str = year.to_string();
        let month_str = format!("{month:02}");
        return Some(EventDate {
            parsed_start_date: parsed,
            start_day: String::new(),
            start_month: month_str.clone(),
            start_year: year_str.clone(),
            parsed_end_date: parsed,
            end_day: String::new(),
            end_month: month_str,
            end_year: year_str,
            single_date: true,
        });
    }
    None
}

fn try_iso_month_date_range(s: &str) -> Option<EventDate> {
    let pattern = re!(r"^(\d{4})-(\d{2})/(\d{2})$");
    let caps = pattern.captures(s)?;
    let year = parse_int(&caps[1])?;
    let start_month: u8 = caps[2].parse().ok()?;
    let end_month: u8 = caps[3].parse().ok()?;
    let start = make_datetime(year, start_month, 1, 0, 0, 0)?;
    let end = make_datetime(year, end_month, 1, 0, 0, 0)?;
    let year_str = year.to_string();
    Some(EventDate {
        parsed_start_date: start,
        start_day: String::new(),
        start_month: caps[2].to_string(),
        start_year: year_str.clone(),
        parsed_end_date: end,
        end_day: String::new(),
        end_month: caps[3].to_string(),
        end_year: year_str,
        single_date: false,
    })
}

fn try_iso_month_year_date_range(s: &str) -> Option<EventDate> {
    let pattern = re!(r"^(\d{4})-(\d{2})/(\d{4})-(\d{2})$");
    let caps = pattern.captures(s)?;
    let start_year = parse_int(&caps[1])?;
    let start_month: u8 = caps[2].parse().ok()?;
    let end_year = parse_int(&caps[3])?;
    let end_month: u8 = caps[4].parse().ok()?;
    let start = make_datetime(start_year, start_month, 1, 0, 0, 0)?;
    let end = make_datetime(end_year, end_month, 1, 0, 0, 0)?;
    Some(EventDate {
        parsed_start_date: start,
        start_day: String::new(),
        start_month: caps[2].to_string(),
        start_year: start_year.to_string(),
        parsed_end_date: end,
        end_day: String::new(),
        end_month: caps[4].to_string(),
        end_year: end_year.to_string(),
        single_date: false,
    })
}

fn try_iso_year_range(s: &str) -> Option<EventDate> {
    let pattern = re!(r"^(\d{4})/(\d{1,4})$");
    let caps = pattern.captures(s)?;
    let start_year = parse_int(&caps[1])?;
    let suffix = &caps[2];
    let end_year = match suffix.len() {
        4 => parse_int(suffix)?,
        3 => start_year / 1000 * 1000 + suffix.parse::<i32>().ok()?,
        2 => start_year / 100 * 100 + suffix.parse::<i32>().ok()?,
        1 => start_year / 10 * 10 + suffix.parse::<i32>().ok()?,
        _ => return None,
    };
    let start = make_datetime(start_year, 1, 1, 0, 0, 0)?;
    let end = make_datetime(end_year, 1, 1, 0, 0, 0)?;
    Some(EventDate {
        parsed_start_date: start,
        start_day: String::new(),
        start_month: String::new(),
        start_year: start_year.to_string(),
        parsed_end_date: end,
        end_day: String::new(),
        end_month: String::new(),
        end_year: end_year.to_string(),
        single_date: false,
    })
}

fn try_iso_verbose_date_time_range(s: &str) -> Option<EventDate> {
    let pattern = re!(
        r"^[A-Za-z]{3} ([A-Za-z]{3}) (\d{2}) (\d{2}):(\d{2}):(\d{2}) [A-Za-z]{2,5} (\d{4})$"
    );
    if let Some((left, right)) = s.split_once('/') {
        let l = pattern.captures(left)?;
        let r = pattern.captures(right)?;
        let start_month = month_from_name(&l[1])?;
        let end_month = month_from_name(&r[1])?;
        return range(
            parse_int(&l[6])?,
            start_month,
            l[2].parse().ok()?,
            l[2].to_string(),
            format!("{start_month:02}"),
            parse_int(&r[6])?,
            end_month,
            r[2].parse().ok()?,
            r[2].to_string(),
            format!("{end_month:02}"),
        );
    }
    let caps = pattern.captures(s)?;
    let month = month_from_name(&caps[1])?;
    single(
        parse_int(&caps[6])?,
        month,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
        caps[4].parse().ok()?,
        caps[5].parse().ok()?,
        caps[2].to_string(),
        format!("{month:02}"),
    )
}

fn try_non_iso_date_time(s: &str) -> Option<EventDate> {
    let pattern = re!(r"^(\d{4})[-/.](\d{2})[-/.](\d{2})[ T\.](\d{2}):(\d{2}):(\d{2})(?:\.\d+)?$");
    let caps = pattern.captures(s)?;
    single(
        parse_int(&caps[1])?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
        caps[4].parse().ok()?,
        caps[5].parse().ok()?,
        caps[6].parse().ok()?,
        caps[3].to_string(),
        caps[2].to_string(),
    )
}

fn try_non_iso_single_date(s: &str) -> Option<EventDate> {
    if let Some(caps) = re!(r"^(\d{2})[-/](\d{2})[-/](\d{4})$").captures(s) {
        return single(
            parse_int(&caps[3])?,
            caps[2].parse().ok()?,
            caps[1].parse().ok()?,
            0,
            0,
            0,
            caps[1].to_string(),
            caps[2].to_string(),
        );
    }
    if let Some(caps) = re!(r"^(\d{2})[-/ ]([A-Za-z]+)[-/ ](\d{4})$").captures(s) {
        let month = month_from_name(&caps[2])?;
        return single(
            parse_int(&caps[3])?,
            month,
            caps[1].parse().ok()?,
            0,
            0,
            0,
            caps[1].to_string(),
            format!("{month:02}"),
        );
    }
    None
}

type Extractor = fn(&str) -> Option<EventDate>;

const ISO_FAMILY: &[Extractor] = &[
    try_iso_date_time_range,
    try_iso_day_date_range,
    try_iso_day_month_range,
    try_iso_date_range,
    try_iso_with_month_name_date,
    try_iso_single_date,
    try_iso_single_year,
    try_iso_month_year_date_range,
    try_iso_month_date_range,
    try_iso_month_date,
    try_iso_year_range,
    try_iso_verbose_date_time_range,
];

const NON_ISO_FAMILY: &[Extractor] = &[try_non_iso_date_time, try_non_iso_single_date];

/// `start_year <= end_year`; `end_year >= 1600`; `start_year <= current_year`
/// (and, if `bounds` is supplied, additionally within `[min_year, max_year]`).
fn is_valid(ed: &EventDate, current_year: i32, bounds: Option<(i32, i32)>) -> bool {
    let (Ok(start_year), Ok(end_year)) = (ed.start_year.parse::<i32>(), ed.end_year.parse::<i32>())
    else {
        return false;
    };
    if start_year > end_year {
        return false;
    }
    if end_year < 1600 {
        return false;
    }
    if start_year > current_year {
        return false;
    }
    if let Some((min_year, max_year)) = bounds {
        if start_year < min_year || end_year > max_year {
            return false;
        }
    }
    true
}

/// Parses `input` against the ordered ISO-then-non-ISO pattern groups.
/// Strict: no lenient coercion moves out-of-range days/months into
/// adjacent periods. Never panics; failures surface as `None`.
pub fn parse_date(input: &str, current_year: i32, bounds: Option<(i32, i32)>) -> Option<EventDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = strip_subsecond(trimmed);
    let normalized = if normalized.contains('/') {
        normalized
    } else {
        strip_offset(&normalized).to_string()
    };

    for extractor in ISO_FAMILY {
        if let Some(ed) = extractor(&normalized) {
            if is_valid(&ed, current_year, bounds) {
                return Some(ed);
            }
        }
    }
    for extractor in NON_ISO_FAMILY {
        if let Some(ed) = extractor(&normalized) {
            if is_valid(&ed, current_year, bounds) {
                return Some(ed);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i32 = 2026;

    #[test]
    fn scenario_iso_date_time_range() {
        let ed = parse_date(
            "2007-03-01T13:00:00Z/2008-05-11T15:30:00Z",
            NOW,
            None,
        )
        .unwrap();
        assert_eq!(ed.start_year, "2007");
        assert_eq!(ed.end_year, "2008");
        assert!(!ed.single_date);
    }

    #[test]
    fn scenario_month_only() {
        let ed = parse_date("1906-06", NOW, None).unwrap();
        assert_eq!(ed.start_month, "06");
        assert_eq!(ed.start_year, "1906");
        assert_eq!(ed.start_day, "");
        assert!(ed.single_date);
    }

    #[test]
    fn scenario_day_range() {
        let ed = parse_date("2007-11-13/15", NOW, None).unwrap();
        assert_eq!(ed.start_day, "13");
        assert_eq!(ed.end_day, "15");
        assert!(!ed.single_date);
    }

    #[test]
    fn scenario_future_year_rejected() {
        assert!(parse_date("2999-01-01", NOW, None).is_none());
    }

    #[test]
    fn year_range_short_suffix_inherits_decade() {
        let ed = parse_date("1998/99", NOW, None).unwrap();
        assert_eq!(ed.start_year, "1998");
        assert_eq!(ed.end_year, "1999");
    }

    #[test]
    fn year_only_is_single_date() {
        let ed = parse_date("1999", NOW, None).unwrap();
        assert_eq!(ed.start_year, "1999");
        assert_eq!(ed.end_year, "1999");
        assert!(ed.single_date);
    }

    #[test]
    fn non_iso_single_date_ddmmyyyy() {
        let ed = parse_date("05/03/1999", NOW, None).unwrap();
        assert_eq!(ed.start_day, "05");
        assert_eq!(ed.start_month, "03");
        assert_eq!(ed.start_year, "1999");
    }

    #[test]
    fn non_iso_single_date_with_month_name() {
        let ed = parse_date("05-Mar-1999", NOW, None).unwrap();
        assert_eq!(ed.start_day, "05");
        assert_eq!(ed.start_month, "03");
    }

    #[test]
    fn strictness_rejects_invalid_day_of_month() {
        assert!(parse_date("2020-02-31", NOW, None).is_none());
    }

    #[test]
    fn blank_input_yields_none() {
        assert!(parse_date("   ", NOW, None).is_none());
    }

    #[test]
    fn end_year_before_1600_rejected() {
        assert!(parse_date("1500", NOW, None).is_none());
    }
}
