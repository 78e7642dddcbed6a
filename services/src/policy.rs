//! Meeting-window policy. Pure functions of time and a group's schedule.

use crate::error::AttendanceError;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use db::models::group;

/// Minutes of slack before the meeting starts and after it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buffer {
    pub early_minutes: i64,
    pub late_minutes: i64,
}

impl Buffer {
    pub const fn new(early_minutes: i64, late_minutes: i64) -> Self {
        Self {
            early_minutes,
            late_minutes,
        }
    }
}

/// Calendar date of `now` in the service timezone.
pub fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Is `now` inside `[start - early, start + duration + late]` for a meeting at
/// `meeting_time` on the local date of `now`? Both ends are inclusive.
pub fn is_within_window(
    now: DateTime<Utc>,
    meeting_time: NaiveTime,
    duration_minutes: i64,
    early_minutes: i64,
    late_minutes: i64,
    offset: FixedOffset,
) -> bool {
    let local = now.with_timezone(&offset);
    let Some(start) = offset
        .from_local_datetime(&local.date_naive().and_time(meeting_time))
        .single()
    else {
        return false;
    };

    let opens = start - Duration::minutes(early_minutes);
    let closes = start + Duration::minutes(duration_minutes + late_minutes);
    local >= opens && local <= closes
}

pub fn parse_meeting_days(raw: &str) -> Result<Vec<Weekday>, String> {
    let days = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Weekday>().map_err(|_| format!("unknown weekday '{s}'")))
        .collect::<Result<Vec<_>, _>>()?;

    if days.is_empty() {
        return Err("no meeting days".into());
    }
    Ok(days)
}

pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| format!("meeting time '{raw}' is not HH:MM"))
}

/// A group's weekly schedule in typed form.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingPolicy {
    pub group_id: i64,
    pub days: Vec<Weekday>,
    pub time_of_day: NaiveTime,
    pub duration_minutes: i64,
}

impl TryFrom<&group::Model> for MeetingPolicy {
    type Error = AttendanceError;

    fn try_from(g: &group::Model) -> Result<Self, Self::Error> {
        let malformed = |why: String| AttendanceError::MalformedPolicy(format!("group {}: {why}", g.id));

        let days = parse_meeting_days(&g.meeting_days).map_err(malformed)?;
        let time_of_day = parse_time_of_day(&g.meeting_time).map_err(malformed)?;
        if g.duration_minutes <= 0 {
            return Err(malformed("non-positive duration".into()));
        }

        Ok(Self {
            group_id: g.id,
            days,
            time_of_day,
            duration_minutes: i64::from(g.duration_minutes),
        })
    }
}

impl MeetingPolicy {
    pub fn meets_on(&self, date: NaiveDate) -> bool {
        self.days.contains(&date.weekday())
    }

    pub fn meets_today(&self, now: DateTime<Utc>, offset: FixedOffset) -> bool {
        self.meets_on(local_date(now, offset))
    }

    /// Meets today and `now` is inside today's buffered window.
    pub fn window_contains(&self, now: DateTime<Utc>, buffer: Buffer, offset: FixedOffset) -> bool {
        self.meets_today(now, offset)
            && is_within_window(
                now,
                self.time_of_day,
                self.duration_minutes,
                buffer.early_minutes,
                buffer.late_minutes,
                offset,
            )
    }
}
