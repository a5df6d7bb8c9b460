//! Time handling: the scan cutoff, unix → zoned datetimes, and the export
//! datetime format. Zones are either IANA names or fixed offsets.

use serde::Serializer;
use std::fmt;
use std::str::FromStr;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use time_tz::{timezones, Offset, TimeZone, Tz};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Rendered form of exported datetimes, e.g. `2024-03-01 18:30:00+03:00`.
const DATETIME_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
);

const OFFSET_FORMAT: &[FormatItem<'static>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]");

/// Earliest instant still eligible for export. Computed once per scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cutoff {
    now: i64,
    limit: i64,
}

impl Cutoff {
    pub fn new(now: OffsetDateTime, depth_days: u32) -> Self {
        let now = now.unix_timestamp();
        let limit = now.saturating_sub(i64::from(depth_days) * SECONDS_PER_DAY);
        Self { now, limit }
    }

    /// Unix seconds of the cutoff instant.
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Strictly older than the cutoff.
    pub fn is_older(&self, unix_ts: i64) -> bool {
        unix_ts < self.limit
    }

    /// (now, cutoff) rendered in `tz`, for log lines.
    pub fn window(&self, tz: Timezone) -> (String, String) {
        (render_unix(self.now, tz), render_unix(self.limit, tz))
    }
}

/// Zone used for rendered datetimes. Named zones resolve their offset per
/// instant, so DST is honoured.
#[derive(Clone, Copy)]
pub enum Timezone {
    Fixed(UtcOffset),
    Named(&'static Tz),
}

impl Default for Timezone {
    fn default() -> Self {
        Timezone::Fixed(UtcOffset::UTC)
    }
}

impl Timezone {
    /// Offset in effect at `utc`.
    pub fn offset_at(&self, utc: &OffsetDateTime) -> UtcOffset {
        match self {
            Timezone::Fixed(offset) => *offset,
            Timezone::Named(tz) => tz.get_offset_utc(utc).to_utc(),
        }
    }
}

impl PartialEq for Timezone {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Timezone::Fixed(a), Timezone::Fixed(b)) => a == b,
            (Timezone::Named(a), Timezone::Named(b)) => a.name() == b.name(),
            _ => false,
        }
    }
}

impl fmt::Debug for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timezone({self})")
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timezone::Named(tz) => f.write_str(tz.name()),
            Timezone::Fixed(offset) => match offset.format(OFFSET_FORMAT) {
                Ok(s) => f.write_str(&s),
                Err(_) => write!(f, "{offset:?}"),
            },
        }
    }
}

/// `Europe/Moscow`-style names, or `UTC`, `Z`, `+03:00`, `-0530`, `+3`.
impl FromStr for Timezone {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("z") {
            return Ok(Timezone::Fixed(UtcOffset::UTC));
        }
        let (sign, rest) = if let Some(rest) = s.strip_prefix('+') {
            (1i32, rest)
        } else if let Some(rest) = s.strip_prefix('-') {
            (-1i32, rest)
        } else {
            return timezones::get_by_name(s)
                .map(Timezone::Named)
                .ok_or_else(|| format!("unknown timezone {s:?} (expected an IANA name or a +HH:MM offset)"));
        };

        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("invalid offset {s:?}"));
        }
        let (h, m) = match digits.len() {
            1 | 2 => (digits.as_str(), "0"),
            4 => (&digits[..2], &digits[2..]),
            _ => return Err(format!("invalid offset {s:?}")),
        };
        let hours: i32 = h.parse().map_err(|_| format!("invalid offset hours in {s:?}"))?;
        let minutes: i32 = m.parse().map_err(|_| format!("invalid offset minutes in {s:?}"))?;
        if hours > 23 || minutes > 59 {
            return Err(format!("offset out of range: {s:?}"));
        }
        UtcOffset::from_whole_seconds(sign * (hours * 3600 + minutes * 60))
            .map(Timezone::Fixed)
            .map_err(|e| format!("invalid offset {s:?}: {e}"))
    }
}

/// Convert unix seconds to an instant carrying the zone's offset.
/// `None` when the timestamp or the shifted local datetime is out of range.
pub fn from_unix(ts: i64, tz: Timezone) -> Option<OffsetDateTime> {
    let utc = OffsetDateTime::from_unix_timestamp(ts).ok()?;
    utc.checked_to_offset(tz.offset_at(&utc))
}

pub fn format_datetime(dt: &OffsetDateTime) -> String {
    dt.format(DATETIME_FORMAT).unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

fn render_unix(ts: i64, tz: Timezone) -> String {
    match from_unix(ts, tz) {
        Some(dt) => format_datetime(&dt),
        None => ts.to_string(),
    }
}

/// serde helper: write datetimes in the export format.
pub fn serialize_datetime<S: Serializer>(dt: &OffsetDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_datetime(dt))
}
