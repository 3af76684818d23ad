use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{ClosedDay, ConflictReason};
use crate::models::interval::TimeInterval;
use crate::models::schedule::{SlotMode, UserSchedule};
use crate::service::calendar_policy::CalendarPolicy;

type SharedSchedule = Arc<RwLock<UserSchedule>>;

/// Boundary form of a booking outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting: Option<TimeInterval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ConflictReason>,
}

impl From<Result<TimeInterval, ConflictReason>> for BookingResult {
    fn from(result: Result<TimeInterval, ConflictReason>) -> Self {
        match result {
            Ok(meeting) => Self {
                ok: true,
                meeting: Some(meeting),
                reason: None,
            },
            Err(reason) => Self {
                ok: false,
                meeting: None,
                reason: Some(reason),
            },
        }
    }
}

/// Owns every user's schedule. Each schedule sits behind its own lock so
/// bookings for different users never wait on each other.
pub struct SchedulerService {
    policy: CalendarPolicy,
    default_mode: SlotMode,
    users: RwLock<HashMap<String, SharedSchedule>>,
}

impl SchedulerService {
    pub fn new(policy: CalendarPolicy, default_mode: SlotMode) -> Self {
        Self {
            policy,
            default_mode,
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &CalendarPolicy {
        &self.policy
    }

    pub fn default_mode(&self) -> SlotMode {
        self.default_mode
    }

    pub async fn schedule_meeting(
        &self,
        user_id: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: i64,
    ) -> Result<TimeInterval, ConflictReason> {
        let interval = TimeInterval::from_parts(date, start_time, duration_minutes)?;
        let schedule = self.schedule_for_booking(user_id).await;
        let mut schedule = schedule.write().await;
        match schedule.try_book(&self.policy, interval) {
            Ok(()) => {
                tracing::info!(user = user_id, meeting = %interval, "meeting scheduled");
                Ok(interval)
            }
            Err(reason) => {
                tracing::warn!(user = user_id, meeting = %interval, %reason, "meeting rejected");
                Err(reason)
            }
        }
    }

    pub async fn check_available_slots(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<(NaiveTime, NaiveTime)>, ClosedDay> {
        self.check_available_slots_with(user_id, date, self.default_mode)
            .await
    }

    pub async fn check_available_slots_with(
        &self,
        user_id: &str,
        date: NaiveDate,
        mode: SlotMode,
    ) -> Result<Vec<(NaiveTime, NaiveTime)>, ClosedDay> {
        let Some(schedule) = self.existing_schedule(user_id).await else {
            let empty = UserSchedule::new();
            return collect_times(&empty, &self.policy, date, mode);
        };
        let schedule = schedule.read().await;
        collect_times(&schedule, &self.policy, date, mode)
    }

    pub async fn view_scheduled_meetings(&self, user_id: &str) -> Vec<TimeInterval> {
        let Some(schedule) = self.existing_schedule(user_id).await else {
            return Vec::new();
        };
        let schedule = schedule.read().await;
        schedule.meetings().to_vec()
    }

    pub async fn user_ids(&self) -> Vec<String> {
        let users = self.users.read().await;
        let mut ids: Vec<String> = users.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn existing_schedule(&self, user_id: &str) -> Option<SharedSchedule> {
        let users = self.users.read().await;
        users.get(user_id).cloned()
    }

    async fn schedule_for_booking(&self, user_id: &str) -> SharedSchedule {
        if let Some(schedule) = self.existing_schedule(user_id).await {
            return schedule;
        }
        let mut users = self.users.write().await;
        users
            .entry(user_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(user = user_id, "creating schedule");
                Arc::new(RwLock::new(UserSchedule::new()))
            })
            .clone()
    }
}

fn collect_times(
    schedule: &UserSchedule,
    policy: &CalendarPolicy,
    date: NaiveDate,
    mode: SlotMode,
) -> Result<Vec<(NaiveTime, NaiveTime)>, ClosedDay> {
    let slots = schedule.free_slots(policy, date, mode)?;
    Ok(slots.iter().map(|slot| slot.times()).collect())
}
