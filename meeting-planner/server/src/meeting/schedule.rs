//! Turns user supplied date text and IANA zone names into normalized UTC instants.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    SubsecRound, TimeZone, Utc,
};
use chrono_tz::Tz;

const LOCAL_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Earliest year a PostgreSQL `timestamptz` column can hold (4713 BC).
const MIN_STORABLE_YEAR: i32 = -4712;

/// Fractional second digits a PostgreSQL timestamp keeps.
const STORED_SUBSEC_DIGITS: u16 = 6;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Date '{0}' does not match the expected ISO-8601 format")]
    DateParse(String),
    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),
}

/// Resolves an IANA zone identifier such as `Europe/Paris`.
pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    name.parse::<Tz>()
        .map_err(|_| ScheduleError::UnknownTimezone(name.to_string()))
}

/// Normalizes a meeting date to UTC, truncated to microseconds.
///
/// With a zone, `date_text` is a local date-time (`2018-02-03T12:30:30`) read as wall-clock
/// time in that zone. Without one, `date_text` is a plain date (`2018-05-07`) taken as
/// midnight UTC.
pub fn normalize_meeting_date(
    date_text: &str,
    timezone: Option<&str>,
) -> Result<DateTime<Utc>, ScheduleError> {
    let instant = match timezone {
        Some(name) => {
            let zone = parse_timezone(name)?;
            let local = parse_local_date_time(date_text)?;
            resolve_local(&zone, local, date_text)?
        }
        None => parse_date(date_text)?.and_time(NaiveTime::MIN).and_utc(),
    };
    storable(instant.trunc_subsecs(STORED_SUBSEC_DIGITS), date_text)
}

/// Parses one end of a date range.
///
/// Accepts an RFC 3339 instant, a local date-time or a plain date. Local values are read in
/// `timezone` when given, otherwise as UTC.
pub fn parse_range_bound(
    text: &str,
    timezone: Option<&str>,
) -> Result<DateTime<Utc>, ScheduleError> {
    let zone = timezone.map(parse_timezone).transpose()?;
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return storable(instant.with_timezone(&Utc), text);
    }

    let local = match parse_local_date_time(text) {
        Ok(local) => local,
        Err(_) => parse_date(text)?.and_time(NaiveTime::MIN),
    };
    let instant = match zone {
        Some(zone) => resolve_local(&zone, local, text)?,
        None => local.and_utc(),
    };
    storable(instant, text)
}

fn parse_local_date_time(text: &str) -> Result<NaiveDateTime, ScheduleError> {
    LOCAL_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| ScheduleError::DateParse(text.to_string()))
}

fn parse_date(text: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| ScheduleError::DateParse(text.to_string()))
}

/// Rejects instants the meeting table cannot represent.
fn storable(instant: DateTime<Utc>, text: &str) -> Result<DateTime<Utc>, ScheduleError> {
    if instant.year() < MIN_STORABLE_YEAR {
        return Err(ScheduleError::DateParse(text.to_string()));
    }
    Ok(instant)
}

/// Maps wall-clock time in `zone` to an instant.
///
/// Overlaps resolve to the earlier instant. Times inside a gap are read with the offset in
/// force before the gap, which pushes them forward by the gap length. Local times whose
/// instant falls outside chrono's range are rejected as unparseable.
fn resolve_local(
    zone: &Tz,
    local: NaiveDateTime,
    text: &str,
) -> Result<DateTime<Utc>, ScheduleError> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(zoned) => Ok(zoned.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => local
            .checked_sub_signed(Duration::days(1))
            .map(|day_before| zone.offset_from_utc_datetime(&day_before).fix())
            .and_then(|before_gap| {
                local.checked_sub_signed(Duration::seconds(i64::from(
                    before_gap.local_minus_utc(),
                )))
            })
            .map(|utc| utc.and_utc())
            .ok_or_else(|| ScheduleError::DateParse(text.to_string())),
    }
}
