// src/services/registration_service.rs
use crate::models::{EventRegistration, EventStatus, RegisterForEventRequest, ServiceError};
use crate::services::access::{can_manage_event, require_event_member, require_user};
use crate::utils::validation::{normalize_email, required_text};
use crate::utils::Store;
use chrono::Utc;
use log::{error, info};
use uuid::Uuid;

const MAX_ATTENDEE_NAME_LENGTH: usize = 100;

/// Register an attendee. Signing in is optional; a signed-in caller's email is
/// used when none is given.
///
/// The capacity check and the insert run inside one store transaction, so the
/// number of registrations can never exceed `max_capacity`.
pub fn register_for_event(
    store: &Store,
    user_id: Option<&str>,
    event_id: &str,
    request: RegisterForEventRequest,
) -> Result<EventRegistration, ServiceError> {
    let attendee_name = required_text("Attendee name", &request.attendee_name, MAX_ATTENDEE_NAME_LENGTH)?;

    let tx = store.transaction()?;
    let user = match user_id {
        Some(id) => Some(require_user(store, id)?),
        None => None,
    };

    let attendee_email = match (request.attendee_email, &user) {
        (Some(email), _) => normalize_email(&email)?,
        (None, Some(user)) => user.email.to_lowercase(),
        (None, None) => return Err(ServiceError::bad_request("Attendee email is required")),
    };

    let event = store
        .find_event_by_id(event_id)?
        .filter(|event| event.status != EventStatus::Draft)
        .ok_or_else(|| ServiceError::not_found("Event"))?;

    if event.status != EventStatus::Published {
        return Err(ServiceError::bad_request("Event is not open for registration"));
    }
    if event.has_ended(Utc::now()) {
        return Err(ServiceError::bad_request("Event has already ended"));
    }

    if store.find_registration_by_email(&event.id, &attendee_email)?.is_some() {
        return Err(ServiceError::Conflict(
            "This email is already registered for the event".to_string(),
        ));
    }

    if let Some(capacity) = event.max_capacity {
        let registered = store.count_registrations(&event.id)?;
        if registered >= capacity as usize {
            info!("🚫 Event: {} is full ({}/{})", event.id, registered, capacity);
            return Err(ServiceError::Conflict("Event is at full capacity".to_string()));
        }
    }

    let registration = EventRegistration {
        id: Uuid::new_v4().to_string(),
        event_id: event.id.clone(),
        attendee_name,
        attendee_email,
        user_id: user.map(|user| user.id),
        registered_at: Utc::now(),
    };
    store.save_registration(&registration)?;

    tx.commit();
    info!("🎟️ Registration: {} for event: {}", registration.id, event.id);
    Ok(registration)
}

// The registered user, the organizer, or a team admin can cancel
pub fn cancel_registration(store: &Store, user_id: &str, registration_id: &str) -> Result<(), ServiceError> {
    let tx = store.transaction()?;
    let registration = store
        .find_registration_by_id(registration_id)?
        .ok_or_else(|| ServiceError::not_found("Registration"))?;

    let is_registrant = registration.user_id.as_deref() == Some(user_id);
    if !is_registrant {
        let (event, member) = require_event_member(store, user_id, &registration.event_id)?;
        if !can_manage_event(&event, &member) {
            error!("❌ User: {} cannot cancel registration: {}", user_id, registration_id);
            return Err(ServiceError::Forbidden);
        }
    }

    store.delete_registration(&registration.id)?;
    tx.commit();
    info!("🗑️ Registration cancelled: {}", registration.id);
    Ok(())
}

pub fn list_event_registrations(
    store: &Store,
    user_id: &str,
    event_id: &str,
) -> Result<Vec<EventRegistration>, ServiceError> {
    let (event, _) = require_event_member(store, user_id, event_id)?;
    store.get_registrations_for_event(&event.id)
}

pub fn list_my_registrations(store: &Store, user_id: &str) -> Result<Vec<EventRegistration>, ServiceError> {
    require_user(store, user_id)?;
    store.get_registrations_for_user(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TeamRole;
    use crate::services::event_service::test_support::{event_request, published_event};
    use crate::services::event_service::{create_event, set_event_status};
    use crate::services::team_service::test_support::{add_member, create_team_for};
    use crate::services::user_service::test_support::create_user;
    use crate::utils::store::test_support::temp_store;
    use std::sync::Arc;

    fn attendee(name: &str, email: &str) -> RegisterForEventRequest {
        RegisterForEventRequest {
            attendee_name: name.to_string(),
            attendee_email: Some(email.to_string()),
        }
    }

    #[test]
    fn registrations_never_exceed_capacity() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        let event = published_event(&store, &ada.id, &team.id, Some(2));

        register_for_event(&store, None, &event.id, attendee("One", "one@example.com")).unwrap();
        register_for_event(&store, None, &event.id, attendee("Two", "two@example.com")).unwrap();
        let third = register_for_event(&store, None, &event.id, attendee("Three", "three@example.com"));

        assert!(matches!(third, Err(ServiceError::Conflict(_))));
        assert_eq!(store.count_registrations(&event.id).unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_respect_capacity() {
        let store = Arc::new(temp_store());
        let ada = create_user(&store, "ada@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        let event = published_event(&store, &ada.id, &team.id, Some(5));

        let mut handles = Vec::new();
        for n in 0..20 {
            let store = Arc::clone(&store);
            let event_id = event.id.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                register_for_event(
                    &store,
                    None,
                    &event_id,
                    attendee(&format!("Guest {}", n), &format!("guest{}@example.com", n)),
                )
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) => assert!(matches!(err, ServiceError::Conflict(_))),
            }
        }

        assert_eq!(accepted, 5);
        assert_eq!(store.count_registrations(&event.id).unwrap(), 5);
    }

    #[test]
    fn an_email_registers_once_per_event() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        let event = published_event(&store, &ada.id, &team.id, None);

        register_for_event(&store, None, &event.id, attendee("Guest", "guest@example.com")).unwrap();
        let again = register_for_event(&store, None, &event.id, attendee("Guest", "GUEST@example.com"));
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn drafts_and_cancelled_events_reject_registrations() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        let draft = create_event(&store, &ada.id, &team.id, event_request("Draft", None)).unwrap();

        assert!(matches!(
            register_for_event(&store, None, &draft.event.id, attendee("G", "g@example.com")),
            Err(ServiceError::NotFound(_))
        ));

        let event = published_event(&store, &ada.id, &team.id, None);
        set_event_status(&store, &ada.id, &event.id, EventStatus::Cancelled).unwrap();
        assert!(matches!(
            register_for_event(&store, None, &event.id, attendee("G", "g@example.com")),
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[test]
    fn signed_in_attendees_default_to_their_own_email() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let grace = create_user(&store, "grace@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        let event = published_event(&store, &ada.id, &team.id, None);

        let registration = register_for_event(
            &store,
            Some(&grace.id),
            &event.id,
            RegisterForEventRequest {
                attendee_name: "Grace".to_string(),
                attendee_email: None,
            },
        )
        .unwrap();
        assert_eq!(registration.attendee_email, "grace@example.com");
        assert_eq!(registration.user_id.as_deref(), Some(grace.id.as_str()));

        let mine = list_my_registrations(&store, &grace.id).unwrap();
        assert_eq!(mine.len(), 1);

        let anonymous = register_for_event(
            &store,
            None,
            &event.id,
            RegisterForEventRequest {
                attendee_name: "Nobody".to_string(),
                attendee_email: None,
            },
        );
        assert!(matches!(anonymous, Err(ServiceError::BadRequest(_))));
    }

    #[test]
    fn cancellation_rights() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let grace = create_user(&store, "grace@example.com");
        let ken = create_user(&store, "ken@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        add_member(&store, &team.id, &ken.id, TeamRole::Member);
        let event = published_event(&store, &ada.id, &team.id, Some(1));

        let registration = register_for_event(
            &store,
            Some(&grace.id),
            &event.id,
            attendee("Grace", "grace@example.com"),
        )
        .unwrap();

        // A plain member who did not organise the event cannot cancel it
        assert!(matches!(
            cancel_registration(&store, &ken.id, &registration.id),
            Err(ServiceError::Forbidden)
        ));

        cancel_registration(&store, &grace.id, &registration.id).unwrap();
        // The freed seat can be taken again
        register_for_event(&store, None, &event.id, attendee("Linus", "linus@example.com")).unwrap();
    }

    #[test]
    fn only_members_list_registrations() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let mallory = create_user(&store, "mallory@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        let event = published_event(&store, &ada.id, &team.id, None);
        register_for_event(&store, None, &event.id, attendee("Guest", "guest@example.com")).unwrap();

        assert_eq!(list_event_registrations(&store, &ada.id, &event.id).unwrap().len(), 1);
        assert!(matches!(
            list_event_registrations(&store, &mallory.id, &event.id),
            Err(ServiceError::Forbidden)
        ));
    }
}
