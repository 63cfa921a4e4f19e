// src/models/event.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
}

impl EventStatus {
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        matches!(
            (self, next),
            (EventStatus::Draft, EventStatus::Published)
                | (EventStatus::Published, EventStatus::Draft)
                | (EventStatus::Draft, EventStatus::Cancelled)
                | (EventStatus::Published, EventStatus::Cancelled)
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Event {
    pub id: String,
    pub team_id: String,
    pub organizer_id: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub timezone: Option<String>,
    pub cover_image_storage_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: EventStatus,
    pub max_capacity: Option<u32>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub cover_image_storage_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub max_capacity: Option<u32>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub timezone: Option<String>,
    pub cover_image_storage_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub max_capacity: Option<u32>,
    #[serde(default)]
    pub remove_capacity_limit: bool,
    pub is_public: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateEventStatusRequest {
    pub status: EventStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventWithStats {
    #[serde(flatten)]
    pub event: Event,
    pub registration_count: usize,
    pub spots_remaining: Option<u32>,
}

impl EventWithStats {
    pub fn new(event: Event, registration_count: usize) -> Self {
        let spots_remaining = event
            .max_capacity
            .map(|capacity| (capacity as usize).saturating_sub(registration_count) as u32);

        Self {
            event,
            registration_count,
            spots_remaining,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventRegistration {
    pub id: String,
    pub event_id: String,
    pub attendee_name: String,
    pub attendee_email: String,
    pub user_id: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterForEventRequest {
    pub attendee_name: String,
    #[serde(default)]
    pub attendee_email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_is_terminal() {
        for next in [EventStatus::Draft, EventStatus::Published, EventStatus::Cancelled] {
            assert!(!EventStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn drafts_and_published_events_move_between_each_other() {
        assert!(EventStatus::Draft.can_transition_to(EventStatus::Published));
        assert!(EventStatus::Published.can_transition_to(EventStatus::Draft));
        assert!(EventStatus::Published.can_transition_to(EventStatus::Cancelled));
        assert!(!EventStatus::Draft.can_transition_to(EventStatus::Draft));
    }
}
