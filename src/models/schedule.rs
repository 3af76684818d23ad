use std::num::NonZeroU32;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{ClosedDay, ConflictReason};
use crate::models::interval::TimeInterval;
use crate::service::calendar_policy::CalendarPolicy;

/// How free time on a day is enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SlotMode {
    /// Maximal gaps between bookings, from opening to closing time.
    Gaps,
    /// Fixed-length slots aligned to the opening time.
    Grid { granularity: NonZeroU32 },
}

impl SlotMode {
    pub fn grid(minutes: u32) -> Option<Self> {
        NonZeroU32::new(minutes).map(|granularity| SlotMode::Grid { granularity })
    }
}

/// One user's bookings, sorted by start and pairwise non-overlapping.
#[derive(Debug, Clone, Default)]
pub struct UserSchedule {
    meetings: Vec<TimeInterval>,
}

impl UserSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the candidate fully before touching the schedule; a
    /// rejected booking leaves it unchanged.
    pub fn try_book(
        &mut self,
        policy: &CalendarPolicy,
        interval: TimeInterval,
    ) -> Result<(), ConflictReason> {
        let date = interval.date();
        if let Some(reason) = policy.closed_reason(date) {
            return Err(ConflictReason::NotAWorkingDay { date, reason });
        }
        if !policy.contains(&interval) {
            let (start_hour, end_hour) = policy.work_hours();
            return Err(ConflictReason::OutsideWorkingHours {
                start_hour,
                end_hour,
            });
        }

        let idx = self
            .meetings
            .partition_point(|existing| existing.start() < interval.start());
        // Sorted and disjoint, so only the neighbours at `idx` can overlap.
        let before = idx.checked_sub(1).and_then(|i| self.meetings.get(i));
        let after = self.meetings.get(idx);
        if let Some(conflict) = before
            .into_iter()
            .chain(after)
            .find(|existing| existing.overlaps(&interval))
        {
            return Err(ConflictReason::Overlap(*conflict));
        }

        self.meetings.insert(idx, interval);
        Ok(())
    }

    pub fn meetings(&self) -> &[TimeInterval] {
        &self.meetings
    }

    /// Bookings starting on `date`, in order.
    pub fn meetings_on(&self, date: NaiveDate) -> &[TimeInterval] {
        let day_start = date.and_time(chrono::NaiveTime::MIN);
        let from = self
            .meetings
            .partition_point(|m| m.start() < day_start);
        let to = match date.succ_opt() {
            Some(next) => {
                let next_start = next.and_time(chrono::NaiveTime::MIN);
                self.meetings.partition_point(|m| m.start() < next_start)
            }
            None => self.meetings.len(),
        };
        &self.meetings[from..to]
    }

    pub fn len(&self) -> usize {
        self.meetings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }

    pub fn free_slots(
        &self,
        policy: &CalendarPolicy,
        date: NaiveDate,
        mode: SlotMode,
    ) -> Result<FreeSlots<'_>, ClosedDay> {
        if let Some(reason) = policy.closed_reason(date) {
            return Err(ClosedDay { date, reason });
        }
        Ok(FreeSlots {
            booked: self.meetings_on(date),
            open: policy.opening(date),
            close: policy.closing(date),
            mode,
        })
    }
}

/// Free time on one working day. Each pass over it recomputes the slots
/// from the borrowed bookings, so it can be iterated any number of times.
#[derive(Debug, Clone, Copy)]
pub struct FreeSlots<'a> {
    booked: &'a [TimeInterval],
    open: NaiveDateTime,
    close: NaiveDateTime,
    mode: SlotMode,
}

impl<'a> FreeSlots<'a> {
    pub fn iter(&self) -> SlotIter<'a> {
        match self.mode {
            SlotMode::Gaps => SlotIter::Gaps {
                booked: self.booked,
                cursor: self.open,
                close: self.close,
            },
            SlotMode::Grid { granularity } => SlotIter::Grid {
                booked: self.booked,
                cursor: self.open,
                step: Duration::minutes(i64::from(granularity.get())),
                close: self.close,
            },
        }
    }

    pub fn mode(&self) -> SlotMode {
        self.mode
    }
}

impl<'a> IntoIterator for FreeSlots<'a> {
    type Item = TimeInterval;
    type IntoIter = SlotIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &FreeSlots<'a> {
    type Item = TimeInterval;
    type IntoIter = SlotIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub enum SlotIter<'a> {
    Gaps {
        booked: &'a [TimeInterval],
        cursor: NaiveDateTime,
        close: NaiveDateTime,
    },
    Grid {
        booked: &'a [TimeInterval],
        cursor: NaiveDateTime,
        step: Duration,
        close: NaiveDateTime,
    },
}

impl Iterator for SlotIter<'_> {
    type Item = TimeInterval;

    fn next(&mut self) -> Option<TimeInterval> {
        match self {
            SlotIter::Gaps {
                booked,
                cursor,
                close,
            } => loop {
                if *cursor >= *close {
                    return None;
                }
                let remaining = *booked;
                let Some((first, rest)) = remaining.split_first() else {
                    let gap = TimeInterval::new(*cursor, *close).ok();
                    *cursor = *close;
                    return gap;
                };
                *booked = rest;
                let gap_start = *cursor;
                let gap_end = first.start().min(*close);
                *cursor = (*cursor).max(first.end());
                if gap_start < gap_end {
                    return TimeInterval::new(gap_start, gap_end).ok();
                }
            },
            SlotIter::Grid {
                booked,
                cursor,
                step,
                close,
            } => loop {
                let slot_end = cursor.checked_add_signed(*step)?;
                if slot_end > *close {
                    return None;
                }
                let slot = TimeInterval::new(*cursor, slot_end).ok()?;
                *cursor = slot_end;
                // Bookings that end before this slot cannot touch later ones.
                let remaining = *booked;
                let skip = remaining.partition_point(|b| b.end() <= slot.start());
                *booked = &remaining[skip..];
                if !booked.iter().take_while(|b| b.start() < slot.end()).any(|b| b.overlaps(&slot)) {
                    return Some(slot);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClosedReason;
    use crate::service::calendar_policy::HolidayCalendar;
    use chrono::NaiveTime;

    fn policy() -> CalendarPolicy {
        CalendarPolicy::new(9, 17, HolidayCalendar::new()).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 18).unwrap()
    }

    fn slot(d: NaiveDate, (sh, sm): (u32, u32), (eh, em): (u32, u32)) -> TimeInterval {
        TimeInterval::new(
            d.and_hms_opt(sh, sm, 0).unwrap(),
            d.and_hms_opt(eh, em, 0).unwrap(),
        )
        .unwrap()
    }

    fn times(slots: &FreeSlots<'_>) -> Vec<(NaiveTime, NaiveTime)> {
        slots.iter().map(|s| s.times()).collect()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn overlapping_booking_reports_the_conflict() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        let first = slot(day(), (10, 0), (11, 0));
        schedule.try_book(&policy, first).unwrap();

        let result = schedule.try_book(&policy, slot(day(), (10, 30), (11, 30)));
        assert_eq!(result, Err(ConflictReason::Overlap(first)));
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn rejection_is_idempotent() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        let first = slot(day(), (10, 0), (11, 0));
        schedule.try_book(&policy, first).unwrap();

        let candidate = slot(day(), (9, 30), (10, 30));
        for _ in 0..2 {
            assert_eq!(
                schedule.try_book(&policy, candidate),
                Err(ConflictReason::Overlap(first))
            );
            assert_eq!(schedule.meetings(), &[first]);
        }
    }

    #[test]
    fn overlap_prefers_the_earlier_neighbour() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        let a = slot(day(), (10, 0), (11, 0));
        let b = slot(day(), (11, 30), (12, 0));
        schedule.try_book(&policy, b).unwrap();
        schedule.try_book(&policy, a).unwrap();

        let result = schedule.try_book(&policy, slot(day(), (10, 45), (11, 45)));
        assert_eq!(result, Err(ConflictReason::Overlap(a)));
    }

    #[test]
    fn enclosing_booking_is_an_overlap() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        let inner = slot(day(), (11, 0), (11, 30));
        schedule.try_book(&policy, inner).unwrap();
        assert_eq!(
            schedule.try_book(&policy, slot(day(), (10, 0), (13, 0))),
            Err(ConflictReason::Overlap(inner))
        );
    }

    #[test]
    fn back_to_back_meetings_are_accepted_and_sorted() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        let later = slot(day(), (11, 0), (12, 0));
        let earlier = slot(day(), (10, 0), (11, 0));
        let earliest = slot(day(), (9, 0), (10, 0));
        schedule.try_book(&policy, later).unwrap();
        schedule.try_book(&policy, earliest).unwrap();
        schedule.try_book(&policy, earlier).unwrap();
        assert_eq!(schedule.meetings(), &[earliest, earlier, later]);
    }

    #[test]
    fn closing_boundary() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        assert_eq!(schedule.try_book(&policy, slot(day(), (16, 0), (17, 0))), Ok(()));
        assert_eq!(
            schedule.try_book(&policy, slot(day(), (17, 0), (18, 0))),
            Err(ConflictReason::OutsideWorkingHours {
                start_hour: 9,
                end_hour: 17
            })
        );
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn non_working_day_is_checked_before_hours() {
        let holidays = HolidayCalendar::new().with_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), None);
        let policy = CalendarPolicy::new(9, 17, holidays).unwrap();
        let mut schedule = UserSchedule::new();
        let new_year = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(
            schedule.try_book(&policy, slot(new_year, (7, 0), (8, 0))),
            Err(ConflictReason::NotAWorkingDay {
                date: new_year,
                reason: ClosedReason::Holiday { name: None }
            })
        );
        assert!(schedule.is_empty());
    }

    #[test]
    fn accepted_bookings_stay_sorted_and_disjoint() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        let mut accepted = Vec::new();
        // Deterministic pseudo-random candidates across two weekdays.
        let mut seed: u64 = 7;
        for _ in 0..200 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let d = if seed % 2 == 0 { day() } else { day().succ_opt().unwrap() };
            let start_minute = (seed >> 8) % (10 * 60);
            let length = 15 + (seed >> 24) % 120;
            let start = d.and_hms_opt(8, 0, 0).unwrap() + Duration::minutes(start_minute as i64);
            let candidate = TimeInterval::new(start, start + Duration::minutes(length as i64)).unwrap();
            if schedule.try_book(&policy, candidate).is_ok() {
                accepted.push(candidate);
            }
        }

        let meetings = schedule.meetings();
        assert!(!meetings.is_empty());
        for pair in meetings.windows(2) {
            assert!(pair[0].start() < pair[1].start());
            assert!(pair[0].end() <= pair[1].start());
        }
        accepted.sort();
        assert_eq!(meetings, accepted.as_slice());
    }

    #[test]
    fn gap_mode_splits_around_bookings() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        schedule.try_book(&policy, slot(day(), (10, 0), (11, 0))).unwrap();

        let slots = schedule.free_slots(&policy, day(), SlotMode::Gaps).unwrap();
        assert_eq!(times(&slots), vec![(hm(9, 0), hm(10, 0)), (hm(11, 0), hm(17, 0))]);
    }

    #[test]
    fn gap_mode_skips_zero_length_gaps() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        schedule.try_book(&policy, slot(day(), (9, 0), (10, 0))).unwrap();
        schedule.try_book(&policy, slot(day(), (10, 0), (12, 0))).unwrap();
        schedule.try_book(&policy, slot(day(), (15, 0), (17, 0))).unwrap();

        let slots = schedule.free_slots(&policy, day(), SlotMode::Gaps).unwrap();
        assert_eq!(times(&slots), vec![(hm(12, 0), hm(15, 0))]);
    }

    #[test]
    fn gap_mode_on_full_day_is_empty_not_closed() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        schedule.try_book(&policy, slot(day(), (9, 0), (17, 0))).unwrap();

        let slots = schedule.free_slots(&policy, day(), SlotMode::Gaps).unwrap();
        assert_eq!(slots.iter().count(), 0);
    }

    #[test]
    fn gap_mode_ignores_other_days() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        schedule
            .try_book(&policy, slot(day().succ_opt().unwrap(), (10, 0), (11, 0)))
            .unwrap();

        let slots = schedule.free_slots(&policy, day(), SlotMode::Gaps).unwrap();
        assert_eq!(times(&slots), vec![(hm(9, 0), hm(17, 0))]);
    }

    #[test]
    fn grid_mode_matches_half_hour_listing() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        schedule.try_book(&policy, slot(day(), (10, 0), (11, 0))).unwrap();
        schedule.try_book(&policy, slot(day(), (13, 15), (13, 45))).unwrap();

        let slots = schedule
            .free_slots(&policy, day(), SlotMode::grid(30).unwrap())
            .unwrap();
        let starts: Vec<String> = slots
            .iter()
            .map(|s| s.start().format("%H:%M").to_string())
            .collect();
        assert_eq!(
            starts,
            vec![
                "09:00", "09:30", "11:00", "11:30", "12:00", "12:30", "14:00", "14:30",
                "15:00", "15:30", "16:00", "16:30"
            ]
        );
        assert!(slots.iter().all(|s| s.duration_minutes() == 30));
    }

    #[test]
    fn grid_mode_drops_partial_trailing_slot() {
        let policy = policy();
        let schedule = UserSchedule::new();
        let slots = schedule
            .free_slots(&policy, day(), SlotMode::grid(45).unwrap())
            .unwrap();
        let last = slots.iter().last().unwrap();
        assert_eq!(last.times(), (hm(15, 45), hm(16, 30)));
        assert_eq!(slots.iter().count(), 10);
    }

    fn last_weekday_of_calendar() -> NaiveDate {
        let mut date = NaiveDate::MAX;
        while policy().closed_reason(date).is_some() {
            date = date.pred_opt().unwrap();
        }
        date
    }

    #[test]
    fn grid_mode_stops_at_end_of_calendar() {
        let policy = policy();
        let schedule = UserSchedule::new();
        let last = last_weekday_of_calendar();

        let coarse = schedule
            .free_slots(&policy, last, SlotMode::grid(2880).unwrap())
            .unwrap();
        assert_eq!(coarse.iter().count(), 0);

        let hourly = schedule
            .free_slots(&policy, last, SlotMode::grid(60).unwrap())
            .unwrap();
        assert_eq!(hourly.iter().count(), 8);
    }

    #[test]
    fn free_slots_are_restartable() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        schedule.try_book(&policy, slot(day(), (12, 0), (13, 0))).unwrap();

        let slots = schedule.free_slots(&policy, day(), SlotMode::Gaps).unwrap();
        let first: Vec<_> = slots.iter().collect();
        let second: Vec<_> = (&slots).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn saturday_is_closed_not_empty() {
        let policy = policy();
        let schedule = UserSchedule::new();
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 22).unwrap();
        let result = schedule.free_slots(&policy, saturday, SlotMode::Gaps);
        assert_eq!(
            result.map(|s| s.iter().count()),
            Err(ClosedDay {
                date: saturday,
                reason: ClosedReason::Weekend
            })
        );
    }

    #[test]
    fn meetings_on_selects_one_day() {
        let policy = policy();
        let mut schedule = UserSchedule::new();
        let monday = slot(NaiveDate::from_ymd_opt(2025, 3, 17).unwrap(), (9, 0), (10, 0));
        let tuesday = slot(day(), (9, 0), (10, 0));
        let wednesday = slot(NaiveDate::from_ymd_opt(2025, 3, 19).unwrap(), (9, 0), (10, 0));
        for m in [wednesday, monday, tuesday] {
            schedule.try_book(&policy, m).unwrap();
        }
        assert_eq!(schedule.meetings_on(day()), &[tuesday]);
        assert!(schedule.meetings_on(NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()).is_empty());
    }
}
