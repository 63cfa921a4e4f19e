// src/utils/thread_storage.rs
use crate::models::{ServiceError, Thread, ThreadMessage, ThreadParticipant};
use crate::utils::store::{Store, Table};

impl Store {
    pub fn save_thread(&self, thread: &Thread) -> Result<(), ServiceError> {
        self.put(Table::Threads, &thread.id, thread)
    }

    pub fn find_thread_by_id(&self, thread_id: &str) -> Result<Option<Thread>, ServiceError> {
        self.get(Table::Threads, thread_id)
    }

    pub fn get_threads_for_team(&self, team_id: &str) -> Result<Vec<Thread>, ServiceError> {
        self.find_all(Table::Threads, |thread: &Thread| thread.team_id == team_id)
    }

    pub fn get_threads_for_event(&self, event_id: &str) -> Result<Vec<Thread>, ServiceError> {
        self.find_all(Table::Threads, |thread: &Thread| {
            thread.event_id.as_deref() == Some(event_id)
        })
    }

    pub fn delete_thread(&self, thread_id: &str) -> Result<bool, ServiceError> {
        self.delete(Table::Threads, thread_id)
    }

    pub fn save_participant(&self, participant: &ThreadParticipant) -> Result<(), ServiceError> {
        self.put(Table::ThreadParticipants, &participant.id, participant)
    }

    pub fn find_participant(&self, thread_id: &str, user_id: &str) -> Result<Option<ThreadParticipant>, ServiceError> {
        self.find_one(Table::ThreadParticipants, |participant: &ThreadParticipant| {
            participant.thread_id == thread_id && participant.user_id == user_id
        })
    }

    pub fn get_participants(&self, thread_id: &str) -> Result<Vec<ThreadParticipant>, ServiceError> {
        let mut participants = self.find_all(Table::ThreadParticipants, |participant: &ThreadParticipant| {
            participant.thread_id == thread_id
        })?;
        participants.sort_by_key(|participant| participant.joined_at);
        Ok(participants)
    }

    pub fn delete_participant(&self, participant_id: &str) -> Result<bool, ServiceError> {
        self.delete(Table::ThreadParticipants, participant_id)
    }

    pub fn save_message(&self, message: &ThreadMessage) -> Result<(), ServiceError> {
        self.put(Table::ThreadMessages, &message.id, message)
    }

    pub fn find_message_by_id(&self, message_id: &str) -> Result<Option<ThreadMessage>, ServiceError> {
        self.get(Table::ThreadMessages, message_id)
    }

    // Messages oldest first
    pub fn get_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ServiceError> {
        let mut messages = self.find_all(Table::ThreadMessages, |message: &ThreadMessage| {
            message.thread_id == thread_id
        })?;
        messages.sort_by_key(|message| message.created_at);
        Ok(messages)
    }

    pub fn delete_message(&self, message_id: &str) -> Result<bool, ServiceError> {
        self.delete(Table::ThreadMessages, message_id)
    }

    // Removes the thread with its participants and messages
    pub fn delete_thread_cascade(&self, thread_id: &str) -> Result<(), ServiceError> {
        for message in self.get_messages(thread_id)? {
            self.delete_message(&message.id)?;
        }
        for participant in self.get_participants(thread_id)? {
            self.delete_participant(&participant.id)?;
        }
        self.delete_thread(thread_id)?;
        Ok(())
    }
}
