// src/services/event_service.rs
use crate::models::{
    CreateEventRequest, Event, EventStatus, EventWithStats, ServiceError, UpdateEventRequest,
};
use crate::services::access::{can_manage_event, require_event_member, require_member};
use crate::utils::slug::unique_slug;
use crate::utils::validation::{optional_text, required_text};
use crate::utils::Store;
use chrono::{DateTime, Utc};
use log::{error, info};
use uuid::Uuid;

const MAX_TITLE_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 5000;

pub fn create_event(
    store: &Store,
    user_id: &str,
    team_id: &str,
    request: CreateEventRequest,
) -> Result<EventWithStats, ServiceError> {
    let title = required_text("Title", &request.title, MAX_TITLE_LENGTH)?;
    let description = optional_text(request.description);
    check_description(&description)?;
    check_window(request.start_time, request.end_time)?;
    check_capacity(request.max_capacity)?;

    let tx = store.transaction()?;
    require_member(store, user_id, team_id)?;

    info!("📅 Creating event: {} in team: {}", title, team_id);

    let slug = unique_slug(&title, |candidate| store.event_slug_exists(candidate))?;
    let now = Utc::now();
    let event = Event {
        id: Uuid::new_v4().to_string(),
        team_id: team_id.to_string(),
        organizer_id: user_id.to_string(),
        title,
        slug,
        description,
        location: optional_text(request.location),
        timezone: optional_text(request.timezone),
        cover_image_storage_id: optional_text(request.cover_image_storage_id),
        start_time: request.start_time,
        end_time: request.end_time,
        status: EventStatus::Draft,
        max_capacity: request.max_capacity,
        is_public: request.is_public.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    store.save_event(&event)?;

    tx.commit();
    info!("✅ Event created: {} ({})", event.id, event.slug);
    Ok(EventWithStats::new(event, 0))
}

pub fn update_event(
    store: &Store,
    user_id: &str,
    event_id: &str,
    request: UpdateEventRequest,
) -> Result<EventWithStats, ServiceError> {
    let tx = store.transaction()?;
    let (mut event, member) = require_event_member(store, user_id, event_id)?;

    if !can_manage_event(&event, &member) {
        error!("❌ User: {} cannot edit event: {}", user_id, event_id);
        return Err(ServiceError::Forbidden);
    }
    if event.status == EventStatus::Cancelled {
        return Err(ServiceError::bad_request("Cancelled events cannot be edited"));
    }

    if let Some(title) = request.title {
        event.title = required_text("Title", &title, MAX_TITLE_LENGTH)?;
    }
    if let Some(description) = request.description {
        event.description = optional_text(Some(description));
        check_description(&event.description)?;
    }
    if let Some(location) = request.location {
        event.location = optional_text(Some(location));
    }
    if let Some(timezone) = request.timezone {
        event.timezone = optional_text(Some(timezone));
    }
    if let Some(cover) = request.cover_image_storage_id {
        event.cover_image_storage_id = optional_text(Some(cover));
    }
    if let Some(is_public) = request.is_public {
        event.is_public = is_public;
    }

    event.start_time = request.start_time.unwrap_or(event.start_time);
    event.end_time = request.end_time.unwrap_or(event.end_time);
    check_window(event.start_time, event.end_time)?;

    let registration_count = store.count_registrations(&event.id)?;
    if request.remove_capacity_limit {
        event.max_capacity = None;
    } else if let Some(capacity) = request.max_capacity {
        check_capacity(Some(capacity))?;
        if (capacity as usize) < registration_count {
            return Err(ServiceError::BadRequest(format!(
                "Capacity cannot be lower than the {} existing registrations",
                registration_count
            )));
        }
        event.max_capacity = Some(capacity);
    }

    event.updated_at = Utc::now();
    store.save_event(&event)?;

    tx.commit();
    info!("✅ Event updated: {}", event.id);
    Ok(EventWithStats::new(event, registration_count))
}

pub fn set_event_status(
    store: &Store,
    user_id: &str,
    event_id: &str,
    status: EventStatus,
) -> Result<EventWithStats, ServiceError> {
    let tx = store.transaction()?;
    let (mut event, member) = require_event_member(store, user_id, event_id)?;

    if !can_manage_event(&event, &member) {
        error!("❌ User: {} cannot change status of event: {}", user_id, event_id);
        return Err(ServiceError::Forbidden);
    }
    if !event.status.can_transition_to(status) {
        return Err(ServiceError::BadRequest(format!(
            "Cannot move event from {:?} to {:?}",
            event.status, status
        )));
    }

    event.status = status;
    event.updated_at = Utc::now();
    store.save_event(&event)?;

    tx.commit();
    info!("🔄 Event: {} is now {:?}", event.id, status);
    let registration_count = store.count_registrations(&event.id)?;
    Ok(EventWithStats::new(event, registration_count))
}

pub fn delete_event(store: &Store, user_id: &str, event_id: &str) -> Result<(), ServiceError> {
    let tx = store.transaction()?;
    let (event, member) = require_event_member(store, user_id, event_id)?;

    if !can_manage_event(&event, &member) {
        error!("❌ User: {} cannot delete event: {}", user_id, event_id);
        return Err(ServiceError::Forbidden);
    }

    store.delete_event_cascade(&event.id)?;

    tx.commit();
    info!("🗑️ Event deleted: {}", event.id);
    Ok(())
}

pub fn get_event(store: &Store, user_id: &str, event_id: &str) -> Result<EventWithStats, ServiceError> {
    let (event, _) = require_event_member(store, user_id, event_id)?;
    with_stats(store, event)
}

pub fn list_team_events(
    store: &Store,
    user_id: &str,
    team_id: &str,
    status: Option<EventStatus>,
) -> Result<Vec<EventWithStats>, ServiceError> {
    require_member(store, user_id, team_id)?;

    store
        .get_events_for_team(team_id)?
        .into_iter()
        .filter(|event| status.map_or(true, |status| event.status == status))
        .map(|event| with_stats(store, event))
        .collect()
}

// Public event page; drafts stay hidden
pub fn get_public_event(store: &Store, slug: &str) -> Result<EventWithStats, ServiceError> {
    let event = store
        .find_event_by_slug(slug)?
        .filter(|event| event.status != EventStatus::Draft)
        .ok_or_else(|| ServiceError::not_found("Event"))?;
    with_stats(store, event)
}

// Published public events that have not ended yet, soonest first
pub fn list_public_events(store: &Store) -> Result<Vec<EventWithStats>, ServiceError> {
    let now = Utc::now();
    store
        .find_events(|event| event.status == EventStatus::Published && event.is_public && !event.has_ended(now))?
        .into_iter()
        .map(|event| with_stats(store, event))
        .collect()
}

pub(crate) fn with_stats(store: &Store, event: Event) -> Result<EventWithStats, ServiceError> {
    let registration_count = store.count_registrations(&event.id)?;
    Ok(EventWithStats::new(event, registration_count))
}

fn check_window(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<(), ServiceError> {
    if start_time >= end_time {
        return Err(ServiceError::bad_request("Event must end after it starts"));
    }
    Ok(())
}

fn check_capacity(max_capacity: Option<u32>) -> Result<(), ServiceError> {
    if max_capacity == Some(0) {
        return Err(ServiceError::bad_request("Capacity must be at least 1"));
    }
    Ok(())
}

fn check_description(description: &Option<String>) -> Result<(), ServiceError> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LENGTH => Err(ServiceError::BadRequest(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::Duration;

    pub fn event_request(title: &str, max_capacity: Option<u32>) -> CreateEventRequest {
        let start_time = Utc::now() + Duration::days(3);
        CreateEventRequest {
            title: title.to_string(),
            description: None,
            location: Some("Main hall".to_string()),
            timezone: Some("Europe/London".to_string()),
            cover_image_storage_id: None,
            start_time,
            end_time: start_time + Duration::hours(4),
            max_capacity,
            is_public: None,
        }
    }

    pub fn published_event(store: &Store, user_id: &str, team_id: &str, max_capacity: Option<u32>) -> Event {
        let created = create_event(store, user_id, team_id, event_request("Launch Party", max_capacity))
            .expect("create event");
        set_event_status(store, user_id, &created.event.id, EventStatus::Published)
            .expect("publish event")
            .event
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{event_request, published_event};
    use super::*;
    use crate::models::{EventRegistration, TeamRole};
    use crate::services::team_service::test_support::{add_member, create_team_for};
    use crate::services::user_service::test_support::create_user;
    use crate::utils::store::test_support::temp_store;
    use chrono::Duration;

    #[test]
    fn new_events_start_as_drafts_with_unique_slugs() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");

        let first = create_event(&store, &ada.id, &team.id, event_request("Music Festival 2024!", None)).unwrap();
        let second = create_event(&store, &ada.id, &team.id, event_request("Music Festival 2024", None)).unwrap();

        assert_eq!(first.event.status, EventStatus::Draft);
        assert_eq!(first.event.slug, "music-festival-2024");
        assert_eq!(second.event.slug, "music-festival-2024-1");
        assert_eq!(first.event.organizer_id, ada.id);
        assert!(first.event.is_public);
    }

    #[test]
    fn time_window_and_capacity_are_validated() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");

        let mut backwards = event_request("Backwards", None);
        backwards.end_time = backwards.start_time - Duration::hours(1);
        assert!(matches!(
            create_event(&store, &ada.id, &team.id, backwards),
            Err(ServiceError::BadRequest(_))
        ));

        let mut instant = event_request("Instant", None);
        instant.end_time = instant.start_time;
        assert!(matches!(
            create_event(&store, &ada.id, &team.id, instant),
            Err(ServiceError::BadRequest(_))
        ));

        assert!(matches!(
            create_event(&store, &ada.id, &team.id, event_request("Nobody", Some(0))),
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[test]
    fn non_members_cannot_see_or_create_team_events() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let mallory = create_user(&store, "mallory@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        let event = create_event(&store, &ada.id, &team.id, event_request("Secret", None)).unwrap();

        assert!(matches!(get_event(&store, &mallory.id, &event.event.id), Err(ServiceError::Forbidden)));
        assert!(matches!(
            list_team_events(&store, &mallory.id, &team.id, None),
            Err(ServiceError::Forbidden)
        ));
        assert!(matches!(
            create_event(&store, &mallory.id, &team.id, event_request("Intrusion", None)),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn only_organizers_and_admins_manage_events() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let ken = create_user(&store, "ken@example.com");
        let linus = create_user(&store, "linus@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        add_member(&store, &team.id, &ken.id, TeamRole::Member);
        add_member(&store, &team.id, &linus.id, TeamRole::Member);

        let kens = create_event(&store, &ken.id, &team.id, event_request("Ken's Meetup", None)).unwrap();

        assert!(matches!(
            set_event_status(&store, &linus.id, &kens.event.id, EventStatus::Published),
            Err(ServiceError::Forbidden)
        ));
        set_event_status(&store, &ken.id, &kens.event.id, EventStatus::Published).unwrap();
        set_event_status(&store, &ada.id, &kens.event.id, EventStatus::Cancelled).unwrap();

        assert!(matches!(
            set_event_status(&store, &ada.id, &kens.event.id, EventStatus::Published),
            Err(ServiceError::BadRequest(_))
        ));
        assert!(matches!(
            update_event(
                &store,
                &ken.id,
                &kens.event.id,
                UpdateEventRequest {
                    title: Some("Revived".to_string()),
                    ..Default::default()
                }
            ),
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[test]
    fn capacity_cannot_drop_below_registrations() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        let event = published_event(&store, &ada.id, &team.id, Some(10));

        for n in 0..3 {
            store
                .save_registration(&EventRegistration {
                    id: Uuid::new_v4().to_string(),
                    event_id: event.id.clone(),
                    attendee_name: format!("Guest {}", n),
                    attendee_email: format!("guest{}@example.com", n),
                    user_id: None,
                    registered_at: Utc::now(),
                })
                .unwrap();
        }

        let shrink = |capacity| UpdateEventRequest {
            max_capacity: Some(capacity),
            ..Default::default()
        };
        assert!(matches!(
            update_event(&store, &ada.id, &event.id, shrink(2)),
            Err(ServiceError::BadRequest(_))
        ));

        let updated = update_event(&store, &ada.id, &event.id, shrink(3)).unwrap();
        assert_eq!(updated.registration_count, 3);
        assert_eq!(updated.spots_remaining, Some(0));

        let unlimited = update_event(
            &store,
            &ada.id,
            &event.id,
            UpdateEventRequest {
                remove_capacity_limit: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(unlimited.event.max_capacity, None);
        assert_eq!(unlimited.spots_remaining, None);
    }

    #[test]
    fn public_views_hide_drafts() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        let draft = create_event(&store, &ada.id, &team.id, event_request("Draft Night", None)).unwrap();
        let live = published_event(&store, &ada.id, &team.id, None);

        assert!(matches!(
            get_public_event(&store, &draft.event.slug),
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(get_public_event(&store, &live.slug).unwrap().event.id, live.id);

        let listed = list_public_events(&store).unwrap();
        assert!(listed.iter().any(|e| e.event.id == live.id));
        assert!(listed.iter().all(|e| e.event.id != draft.event.id));
    }

    #[test]
    fn deleting_an_event_removes_its_registrations() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        let event = published_event(&store, &ada.id, &team.id, None);

        let registration = EventRegistration {
            id: Uuid::new_v4().to_string(),
            event_id: event.id.clone(),
            attendee_name: "Guest".to_string(),
            attendee_email: "guest@example.com".to_string(),
            user_id: None,
            registered_at: Utc::now(),
        };
        store.save_registration(&registration).unwrap();

        delete_event(&store, &ada.id, &event.id).unwrap();
        assert!(store.find_event_by_id(&event.id).unwrap().is_none());
        assert!(store.find_registration_by_id(&registration.id).unwrap().is_none());
    }

    #[test]
    fn team_events_can_be_filtered_by_status() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        create_event(&store, &ada.id, &team.id, event_request("Draft", None)).unwrap();
        published_event(&store, &ada.id, &team.id, None);

        assert_eq!(list_team_events(&store, &ada.id, &team.id, None).unwrap().len(), 2);
        let published = list_team_events(&store, &ada.id, &team.id, Some(EventStatus::Published)).unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event.status, EventStatus::Published);
    }
}
