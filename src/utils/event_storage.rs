// src/utils/event_storage.rs
use crate::models::{Event, EventRegistration, ServiceError};
use crate::utils::store::{Store, Table};

impl Store {
    pub fn save_event(&self, event: &Event) -> Result<(), ServiceError> {
        self.put(Table::Events, &event.id, event)
    }

    pub fn find_event_by_id(&self, event_id: &str) -> Result<Option<Event>, ServiceError> {
        self.get(Table::Events, event_id)
    }

    pub fn find_event_by_slug(&self, slug: &str) -> Result<Option<Event>, ServiceError> {
        self.find_one(Table::Events, |event: &Event| event.slug == slug)
    }

    pub fn event_slug_exists(&self, slug: &str) -> Result<bool, ServiceError> {
        Ok(self.find_event_by_slug(slug)?.is_some())
    }

    // Events ordered by start time
    pub fn get_events_for_team(&self, team_id: &str) -> Result<Vec<Event>, ServiceError> {
        let mut events = self.find_all(Table::Events, |event: &Event| event.team_id == team_id)?;
        events.sort_by_key(|event| event.start_time);
        Ok(events)
    }

    pub fn find_events<F>(&self, predicate: F) -> Result<Vec<Event>, ServiceError>
    where
        F: FnMut(&Event) -> bool,
    {
        let mut events = self.find_all(Table::Events, predicate)?;
        events.sort_by_key(|event| event.start_time);
        Ok(events)
    }

    pub fn delete_event(&self, event_id: &str) -> Result<bool, ServiceError> {
        self.delete(Table::Events, event_id)
    }

    pub fn save_registration(&self, registration: &EventRegistration) -> Result<(), ServiceError> {
        self.put(Table::EventRegistrations, &registration.id, registration)
    }

    pub fn find_registration_by_id(&self, registration_id: &str) -> Result<Option<EventRegistration>, ServiceError> {
        self.get(Table::EventRegistrations, registration_id)
    }

    pub fn find_registration_by_email(
        &self,
        event_id: &str,
        email: &str,
    ) -> Result<Option<EventRegistration>, ServiceError> {
        let email = email.trim().to_lowercase();
        self.find_one(Table::EventRegistrations, |registration: &EventRegistration| {
            registration.event_id == event_id && registration.attendee_email == email
        })
    }

    // Registrations ordered by registration time
    pub fn get_registrations_for_event(&self, event_id: &str) -> Result<Vec<EventRegistration>, ServiceError> {
        let mut registrations = self.find_all(Table::EventRegistrations, |registration: &EventRegistration| {
            registration.event_id == event_id
        })?;
        registrations.sort_by_key(|registration| registration.registered_at);
        Ok(registrations)
    }

    pub fn count_registrations(&self, event_id: &str) -> Result<usize, ServiceError> {
        Ok(self.get_registrations_for_event(event_id)?.len())
    }

    pub fn get_registrations_for_user(&self, user_id: &str) -> Result<Vec<EventRegistration>, ServiceError> {
        let mut registrations = self.find_all(Table::EventRegistrations, |registration: &EventRegistration| {
            registration.user_id.as_deref() == Some(user_id)
        })?;
        registrations.sort_by_key(|registration| registration.registered_at);
        Ok(registrations)
    }

    pub fn delete_registration(&self, registration_id: &str) -> Result<bool, ServiceError> {
        self.delete(Table::EventRegistrations, registration_id)
    }

    pub fn delete_event_registrations(&self, event_id: &str) -> Result<usize, ServiceError> {
        let mut deleted = 0;
        for registration in self.get_registrations_for_event(event_id)? {
            if self.delete_registration(&registration.id)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    // Removes the event with its registrations and discussion threads
    pub fn delete_event_cascade(&self, event_id: &str) -> Result<(), ServiceError> {
        self.delete_event_registrations(event_id)?;
        for thread in self.get_threads_for_event(event_id)? {
            self.delete_thread_cascade(&thread.id)?;
        }
        self.delete_event(event_id)?;
        Ok(())
    }
}
