use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Thread {
    pub id: String,
    pub team_id: String,
    pub event_id: Option<String>,
    pub title: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Thread {
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_message_at.unwrap_or(self.created_at)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ThreadParticipant {
    pub id: String,
    pub thread_id: String,
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ThreadMessage {
    pub id: String,
    pub thread_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateThreadRequest {
    pub title: String,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub participant_ids: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ParticipantRequest {
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageRequest {
    pub body: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ThreadSummary {
    #[serde(flatten)]
    pub thread: Thread,
    pub participant_count: usize,
    pub unread_count: usize,
    pub is_participant: bool,
}
