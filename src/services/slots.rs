//! Candidate slot generation and interval conflict detection

use chrono::{Duration, NaiveTime, Timelike};

use crate::{
    error::{AppError, AppResult},
    models::{appointment::Appointment, slot::TimeRange, TimeSlot},
};

const SECONDS_PER_DAY: u32 = 86_400;

/// Fixed-length candidate intervals laid out inside a working window.
///
/// Yields `[t, t + duration)` for `t = window.start, window.start + stride, ...`
/// as long as the interval ends no later than `window.end`. Clone before
/// iterating to walk the same sequence again.
#[derive(Debug, Clone)]
pub struct SlotGenerator {
    cursor: u32,
    window_end: u32,
    duration: u32,
    stride: u32,
}

fn whole_seconds(d: Duration) -> u32 {
    u32::try_from(d.num_seconds()).unwrap_or(0)
}

impl SlotGenerator {
    pub fn new(window: TimeRange, duration: Duration, stride: Duration) -> Self {
        Self {
            cursor: window.start.num_seconds_from_midnight(),
            window_end: window.end.num_seconds_from_midnight(),
            duration: whole_seconds(duration),
            stride: whole_seconds(stride),
        }
    }
}

impl Iterator for SlotGenerator {
    type Item = TimeRange;

    fn next(&mut self) -> Option<TimeRange> {
        if self.duration == 0 || self.stride == 0 {
            return None;
        }
        let end = self.cursor.checked_add(self.duration)?;
        if end > self.window_end {
            return None;
        }
        let slot = TimeRange::new(
            NaiveTime::from_num_seconds_from_midnight_opt(self.cursor, 0)?,
            NaiveTime::from_num_seconds_from_midnight_opt(end, 0)?,
        );
        self.cursor = self.cursor.saturating_add(self.stride);
        Some(slot)
    }
}

/// Half-open interval overlap; touching endpoints do not conflict
pub fn overlaps(a: &TimeRange, b: &TimeRange) -> bool {
    a.overlaps(b)
}

/// Annotate each candidate with whether it collides with an existing booking
pub fn mark_availability<I>(candidates: I, existing: &[TimeRange]) -> Vec<TimeSlot>
where
    I: IntoIterator<Item = TimeRange>,
{
    candidates
        .into_iter()
        .map(|slot| TimeSlot {
            start_time: slot.start,
            end_time: slot.end,
            available: !existing.iter().any(|booked| overlaps(&slot, booked)),
        })
        .collect()
}

/// First active appointment overlapping `requested`
pub fn find_conflict<'a>(
    requested: &TimeRange,
    existing: &'a [Appointment],
) -> Option<&'a Appointment> {
    existing
        .iter()
        .find(|appointment| overlaps(requested, &appointment.range()))
}

/// `[start, start + minutes)`, rejected when it would cross midnight
pub fn interval_from(start: NaiveTime, minutes: i32) -> AppResult<TimeRange> {
    let minutes = u32::try_from(minutes)
        .ok()
        .filter(|m| *m > 0)
        .ok_or_else(|| AppError::Validation("service duration must be positive".to_string()))?;

    let end = minutes
        .checked_mul(60)
        .and_then(|secs| start.num_seconds_from_midnight().checked_add(secs))
        .unwrap_or(u32::MAX);
    if end >= SECONDS_PER_DAY {
        return Err(AppError::Validation(
            "appointment must end before midnight".to_string(),
        ));
    }

    NaiveTime::from_num_seconds_from_midnight_opt(end, 0)
        .map(|end| TimeRange::new(start, end))
        .ok_or_else(|| AppError::Internal(format!("invalid end time offset {}", end)))
}
