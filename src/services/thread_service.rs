// src/services/thread_service.rs
use crate::models::{
    CreateThreadRequest, ServiceError, TeamMember, TeamRole, Thread, ThreadMessage, ThreadParticipant, ThreadSummary,
};
use crate::services::access::{require_event_member, require_member, require_thread_member};
use crate::utils::validation::required_text;
use crate::utils::Store;
use chrono::Utc;
use log::{error, info};
use uuid::Uuid;

const MAX_THREAD_TITLE_LENGTH: usize = 200;
const MAX_MESSAGE_LENGTH: usize = 4000;

pub fn create_thread(
    store: &Store,
    user_id: &str,
    team_id: &str,
    request: CreateThreadRequest,
) -> Result<ThreadSummary, ServiceError> {
    let title = required_text("Thread title", &request.title, MAX_THREAD_TITLE_LENGTH)?;

    let tx = store.transaction()?;
    require_member(store, user_id, team_id)?;

    if let Some(event_id) = &request.event_id {
        let event = store
            .find_event_by_id(event_id)?
            .ok_or_else(|| ServiceError::not_found("Event"))?;
        if event.team_id != team_id {
            return Err(ServiceError::bad_request("Event belongs to another team"));
        }
    }

    let mut participant_ids = vec![user_id.to_string()];
    for participant_id in request.participant_ids {
        if participant_ids.contains(&participant_id) {
            continue;
        }
        if !store.user_has_team_access(&participant_id, team_id)? {
            return Err(ServiceError::BadRequest(format!(
                "User {} is not a member of this team",
                participant_id
            )));
        }
        participant_ids.push(participant_id);
    }

    let now = Utc::now();
    let thread = Thread {
        id: Uuid::new_v4().to_string(),
        team_id: team_id.to_string(),
        event_id: request.event_id,
        title,
        created_by: user_id.to_string(),
        created_at: now,
        last_message_at: None,
    };
    store.save_thread(&thread)?;

    for participant_id in &participant_ids {
        store.save_participant(&ThreadParticipant {
            id: Uuid::new_v4().to_string(),
            thread_id: thread.id.clone(),
            user_id: participant_id.clone(),
            joined_at: now,
            last_read_at: Some(now),
        })?;
    }

    tx.commit();
    info!("💬 Thread created: {} in team: {}", thread.id, team_id);
    Ok(ThreadSummary {
        thread,
        participant_count: participant_ids.len(),
        unread_count: 0,
        is_participant: true,
    })
}

pub fn list_team_threads(store: &Store, user_id: &str, team_id: &str) -> Result<Vec<ThreadSummary>, ServiceError> {
    require_member(store, user_id, team_id)?;
    let threads = store.get_threads_for_team(team_id)?;
    summarize_all(store, user_id, threads)
}

pub fn list_event_threads(store: &Store, user_id: &str, event_id: &str) -> Result<Vec<ThreadSummary>, ServiceError> {
    let (event, _) = require_event_member(store, user_id, event_id)?;
    let threads = store.get_threads_for_event(&event.id)?;
    summarize_all(store, user_id, threads)
}

pub fn get_thread(store: &Store, user_id: &str, thread_id: &str) -> Result<ThreadSummary, ServiceError> {
    let (thread, _) = require_thread_member(store, user_id, thread_id)?;
    summarize(store, user_id, thread)
}

pub fn list_participants(
    store: &Store,
    user_id: &str,
    thread_id: &str,
) -> Result<Vec<ThreadParticipant>, ServiceError> {
    let (thread, _) = require_thread_member(store, user_id, thread_id)?;
    store.get_participants(&thread.id)
}

pub fn add_participant(
    store: &Store,
    user_id: &str,
    thread_id: &str,
    target_user_id: &str,
) -> Result<ThreadParticipant, ServiceError> {
    let tx = store.transaction()?;
    let (thread, actor) = require_thread_member(store, user_id, thread_id)?;

    if !can_moderate(&thread, &actor) {
        error!("❌ User: {} cannot add participants to thread: {}", user_id, thread_id);
        return Err(ServiceError::Forbidden);
    }
    if !store.user_has_team_access(target_user_id, &thread.team_id)? {
        return Err(ServiceError::bad_request("Participants must be members of the team"));
    }

    if let Some(existing) = store.find_participant(&thread.id, target_user_id)? {
        return Ok(existing);
    }

    let participant = join(store, &thread.id, target_user_id)?;
    tx.commit();
    info!("➕ User: {} joined thread: {}", target_user_id, thread.id);
    Ok(participant)
}

// Moderators remove anyone; everyone else can only remove themselves
pub fn remove_participant(
    store: &Store,
    user_id: &str,
    thread_id: &str,
    target_user_id: &str,
) -> Result<(), ServiceError> {
    let tx = store.transaction()?;
    let (thread, actor) = require_thread_member(store, user_id, thread_id)?;

    if user_id != target_user_id && !can_moderate(&thread, &actor) {
        error!("❌ User: {} cannot remove {} from thread: {}", user_id, target_user_id, thread_id);
        return Err(ServiceError::Forbidden);
    }

    let participant = store
        .find_participant(&thread.id, target_user_id)?
        .ok_or_else(|| ServiceError::not_found("Participant"))?;
    store.delete_participant(&participant.id)?;

    tx.commit();
    info!("➖ User: {} left thread: {}", target_user_id, thread.id);
    Ok(())
}

pub fn post_message(store: &Store, user_id: &str, thread_id: &str, body: &str) -> Result<ThreadMessage, ServiceError> {
    let body = required_text("Message", body, MAX_MESSAGE_LENGTH)?;

    let tx = store.transaction()?;
    let (mut thread, _) = require_thread_member(store, user_id, thread_id)?;

    let now = Utc::now();
    let message = ThreadMessage {
        id: Uuid::new_v4().to_string(),
        thread_id: thread.id.clone(),
        author_id: user_id.to_string(),
        body,
        created_at: now,
        edited_at: None,
    };
    store.save_message(&message)?;

    // Posting joins the roster and counts as reading the thread
    let mut participant = match store.find_participant(&thread.id, user_id)? {
        Some(participant) => participant,
        None => join(store, &thread.id, user_id)?,
    };
    participant.last_read_at = Some(now);
    store.save_participant(&participant)?;

    thread.last_message_at = Some(now);
    store.save_thread(&thread)?;

    tx.commit();
    info!("💬 Message posted to thread: {}", thread.id);
    Ok(message)
}

pub fn list_messages(store: &Store, user_id: &str, thread_id: &str) -> Result<Vec<ThreadMessage>, ServiceError> {
    let (thread, _) = require_thread_member(store, user_id, thread_id)?;
    store.get_messages(&thread.id)
}

pub fn edit_message(store: &Store, user_id: &str, message_id: &str, body: &str) -> Result<ThreadMessage, ServiceError> {
    let body = required_text("Message", body, MAX_MESSAGE_LENGTH)?;

    let tx = store.transaction()?;
    let mut message = store
        .find_message_by_id(message_id)?
        .ok_or_else(|| ServiceError::not_found("Message"))?;
    require_thread_member(store, user_id, &message.thread_id)?;

    if message.author_id != user_id {
        error!("❌ User: {} cannot edit message: {}", user_id, message_id);
        return Err(ServiceError::Forbidden);
    }

    message.body = body;
    message.edited_at = Some(Utc::now());
    store.save_message(&message)?;
    tx.commit();
    Ok(message)
}

pub fn delete_message(store: &Store, user_id: &str, message_id: &str) -> Result<(), ServiceError> {
    let tx = store.transaction()?;
    let message = store
        .find_message_by_id(message_id)?
        .ok_or_else(|| ServiceError::not_found("Message"))?;
    let (_, member) = require_thread_member(store, user_id, &message.thread_id)?;

    if message.author_id != user_id && member.role < TeamRole::Admin {
        error!("❌ User: {} cannot delete message: {}", user_id, message_id);
        return Err(ServiceError::Forbidden);
    }

    store.delete_message(&message.id)?;
    tx.commit();
    info!("🗑️ Message deleted: {}", message.id);
    Ok(())
}

pub fn mark_thread_read(store: &Store, user_id: &str, thread_id: &str) -> Result<ThreadSummary, ServiceError> {
    let tx = store.transaction()?;
    let (thread, _) = require_thread_member(store, user_id, thread_id)?;

    let mut participant = store
        .find_participant(&thread.id, user_id)?
        .ok_or_else(|| ServiceError::bad_request("You are not part of this thread"))?;
    participant.last_read_at = Some(Utc::now());
    store.save_participant(&participant)?;
    tx.commit();

    summarize(store, user_id, thread)
}

pub fn delete_thread(store: &Store, user_id: &str, thread_id: &str) -> Result<(), ServiceError> {
    let tx = store.transaction()?;
    let (thread, member) = require_thread_member(store, user_id, thread_id)?;

    if !can_moderate(&thread, &member) {
        error!("❌ User: {} cannot delete thread: {}", user_id, thread_id);
        return Err(ServiceError::Forbidden);
    }

    store.delete_thread_cascade(&thread.id)?;
    tx.commit();
    info!("🗑️ Thread deleted: {}", thread.id);
    Ok(())
}

/// Messages newer than the participant's read marker that someone else wrote.
/// Non-participants have nothing unread.
pub fn unread_count(store: &Store, user_id: &str, thread_id: &str) -> Result<usize, ServiceError> {
    let participant = match store.find_participant(thread_id, user_id)? {
        Some(participant) => participant,
        None => return Ok(0),
    };

    Ok(store
        .get_messages(thread_id)?
        .iter()
        .filter(|message| message.author_id != user_id)
        .filter(|message| participant.last_read_at.map_or(true, |read| message.created_at > read))
        .count())
}

fn can_moderate(thread: &Thread, member: &TeamMember) -> bool {
    thread.created_by == member.user_id || member.role >= TeamRole::Admin
}

fn join(store: &Store, thread_id: &str, user_id: &str) -> Result<ThreadParticipant, ServiceError> {
    let participant = ThreadParticipant {
        id: Uuid::new_v4().to_string(),
        thread_id: thread_id.to_string(),
        user_id: user_id.to_string(),
        joined_at: Utc::now(),
        last_read_at: None,
    };
    store.save_participant(&participant)?;
    Ok(participant)
}

fn summarize(store: &Store, user_id: &str, thread: Thread) -> Result<ThreadSummary, ServiceError> {
    let participants = store.get_participants(&thread.id)?;
    let is_participant = participants.iter().any(|p| p.user_id == user_id);
    let unread_count = unread_count(store, user_id, &thread.id)?;

    Ok(ThreadSummary {
        participant_count: participants.len(),
        unread_count,
        is_participant,
        thread,
    })
}

// Most recent activity first
fn summarize_all(store: &Store, user_id: &str, mut threads: Vec<Thread>) -> Result<Vec<ThreadSummary>, ServiceError> {
    threads.sort_by_key(|thread| std::cmp::Reverse(thread.last_activity()));
    threads
        .into_iter()
        .map(|thread| summarize(store, user_id, thread))
        .collect()
}
