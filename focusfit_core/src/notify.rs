//! Local notification scheduling.
//!
//! The platform notification service sits behind the `Notifier` trait. A
//! notification either fires once at an absolute instant or repeats daily
//! at a local wall-clock time.

use crate::store::{LocalStore, NOTIFICATIONS_KEY};
use crate::{Error, Result};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque id returned when a notification is scheduled
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

impl NotificationId {
    pub fn generate() -> Self {
        NotificationId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// When a notification fires
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    At { at: DateTime<Utc> },
    Daily { time: NaiveTime },
}

impl Trigger {
    /// Next instant this trigger fires strictly after `now`, if any
    ///
    /// Daily times are interpreted in UTC.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Trigger::At { at } => (*at > now).then_some(*at),
            Trigger::Daily { time } => {
                let today = now.date_naive().and_time(*time).and_utc();
                if today > now {
                    Some(today)
                } else {
                    Some(today + Duration::days(1))
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub trigger: Trigger,
    pub title: String,
    pub body: String,
    pub sound: Option<String>,
}

impl NotificationRequest {
    pub fn at(at: DateTime<Utc>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            trigger: Trigger::At { at },
            title: title.into(),
            body: body.into(),
            sound: None,
        }
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }
}

/// Request for the daily "time to move" reminder
pub fn daily_reminder_request(time: NaiveTime) -> NotificationRequest {
    NotificationRequest {
        trigger: Trigger::Daily { time },
        title: "Time for a FocusFit break".into(),
        body: "A short workout keeps the focus streak going.".into(),
        sound: Some("default".into()),
    }
}

/// Parse an "HH:MM" reminder time
pub fn parse_reminder_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| Error::InvalidInput(format!("invalid time '{}': {} (expected HH:MM)", s, e)))
}

/// Schedules and cancels local notifications
pub trait Notifier {
    fn schedule(&mut self, request: NotificationRequest) -> Result<NotificationId>;
    fn cancel(&mut self, id: &NotificationId) -> Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
    fn schedule(&mut self, request: NotificationRequest) -> Result<NotificationId> {
        (**self).schedule(request)
    }

    fn cancel(&mut self, id: &NotificationId) -> Result<()> {
        (**self).cancel(id)
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn schedule(&mut self, request: NotificationRequest) -> Result<NotificationId> {
        (**self).schedule(request)
    }

    fn cancel(&mut self, id: &NotificationId) -> Result<()> {
        (**self).cancel(id)
    }
}

/// A scheduled notification as kept by a notifier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub id: NotificationId,
    pub request: NotificationRequest,
}

/// In-memory notifier that only logs
#[derive(Debug, Default)]
pub struct LogNotifier {
    pending: Vec<ScheduledNotification>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[ScheduledNotification] {
        &self.pending
    }
}

impl Notifier for LogNotifier {
    fn schedule(&mut self, request: NotificationRequest) -> Result<NotificationId> {
        let id = NotificationId::generate();
        tracing::info!(
            "Scheduled notification {} ({:?}): {}",
            id,
            request.trigger,
            request.title
        );
        self.pending.push(ScheduledNotification {
            id: id.clone(),
            request,
        });
        Ok(id)
    }

    fn cancel(&mut self, id: &NotificationId) -> Result<()> {
        let before = self.pending.len();
        self.pending.retain(|n| &n.id != id);
        if self.pending.len() < before {
            tracing::info!("Cancelled notification {}", id);
        } else {
            tracing::debug!("Notification {} was not pending", id);
        }
        Ok(())
    }
}

/// Notifier whose schedule is persisted in the local store
///
/// Daily reminders scheduled here survive restarts.
#[derive(Clone, Debug)]
pub struct StoredNotifier {
    store: LocalStore,
}

impl StoredNotifier {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub fn pending(&self) -> Result<Vec<ScheduledNotification>> {
        self.store.get_or_default(NOTIFICATIONS_KEY)
    }

    /// Cancel every pending daily reminder, returning how many were removed
    pub fn cancel_daily(&mut self) -> Result<usize> {
        let mut removed = 0;
        self.store
            .update(NOTIFICATIONS_KEY, |pending: &mut Vec<ScheduledNotification>| {
                let before = pending.len();
                pending.retain(|n| !matches!(n.request.trigger, Trigger::Daily { .. }));
                removed = before - pending.len();
                Ok(())
            })?;
        Ok(removed)
    }
}

impl Notifier for StoredNotifier {
    fn schedule(&mut self, request: NotificationRequest) -> Result<NotificationId> {
        let id = NotificationId::generate();
        let entry = ScheduledNotification {
            id: id.clone(),
            request,
        };
        self.store
            .update(NOTIFICATIONS_KEY, |pending: &mut Vec<ScheduledNotification>| {
                pending.push(entry);
                Ok(())
            })?;
        tracing::info!("Stored notification {}", id);
        Ok(id)
    }

    fn cancel(&mut self, id: &NotificationId) -> Result<()> {
        self.store
            .update(NOTIFICATIONS_KEY, |pending: &mut Vec<ScheduledNotification>| {
                pending.retain(|n| &n.id != id);
                Ok(())
            })?;
        tracing::info!("Removed stored notification {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_reminder_time() {
        let t = parse_reminder_time("08:30").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert!(parse_reminder_time("8.30").is_err());
        assert!(parse_reminder_time("24:00").is_err());
    }

    #[test]
    fn test_daily_trigger_next_after() {
        let trigger = Trigger::Daily {
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        };
        let morning = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap();

        assert_eq!(
            trigger.next_after(morning),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())
        );
        assert_eq!(
            trigger.next_after(evening),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_one_shot_in_past_never_fires() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        let trigger = Trigger::At { at };
        assert_eq!(trigger.next_after(at + Duration::seconds(1)), None);
    }

    #[test]
    fn test_log_notifier_schedule_and_cancel() {
        let mut notifier = LogNotifier::new();
        let at = Utc::now() + Duration::minutes(25);
        let id = notifier
            .schedule(NotificationRequest::at(at, "Done", "Focus session complete"))
            .unwrap();
        assert_eq!(notifier.pending().len(), 1);

        notifier.cancel(&id).unwrap();
        assert!(notifier.pending().is_empty());

        // Cancelling twice is harmless
        notifier.cancel(&id).unwrap();
    }

    #[test]
    fn test_stored_notifier_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());

        let mut notifier = StoredNotifier::new(store.clone());
        let time = parse_reminder_time("07:45").unwrap();
        notifier.schedule(daily_reminder_request(time)).unwrap();
        let one_shot = notifier
            .schedule(NotificationRequest::at(Utc::now(), "x", "y"))
            .unwrap();

        let reopened = StoredNotifier::new(store);
        assert_eq!(reopened.pending().unwrap().len(), 2);

        notifier.cancel(&one_shot).unwrap();
        let mut reopened = reopened;
        assert_eq!(reopened.cancel_daily().unwrap(), 1);
        assert!(reopened.pending().unwrap().is_empty());
    }
}
