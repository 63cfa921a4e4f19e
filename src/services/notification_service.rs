// src/services/notification_service.rs
//
// Outgoing email side effects. Emails are dispatched on a background task
// after the mutation that caused them has committed; a failed delivery is
// logged and otherwise ignored.
use crate::models::{InvitationDetails, ServiceError};
use log::{info, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, email: &OutgoingEmail) -> Result<(), ServiceError>;
}

// Default mailer: writes the message to the log
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), ServiceError> {
        info!("📧 Email to {}: {}\n{}", email.to, email.subject, email.body);
        Ok(())
    }
}

pub fn invitation_email(invitation: &InvitationDetails, token: &str, app_base_url: &str) -> OutgoingEmail {
    let team_name = invitation.team_name.as_deref().unwrap_or("a team");
    let inviter = invitation.invited_by_name.as_deref().unwrap_or("A teammate");
    let link = format!("{}/invitations/{}", app_base_url.trim_end_matches('/'), token);

    OutgoingEmail {
        to: invitation.email.clone(),
        subject: format!("You're invited to join {}", team_name),
        body: format!(
            "{} invited you to join {} as {}.\n\nAccept the invitation: {}\n\nThis link expires on {}.",
            inviter,
            team_name,
            invitation.role,
            link,
            invitation.expires_at.format("%Y-%m-%d %H:%M UTC")
        ),
    }
}

pub fn deliver(mailer: &dyn Mailer, email: &OutgoingEmail) {
    match mailer.send(email) {
        Ok(()) => info!("✅ Delivered email to {}", email.to),
        Err(e) => warn!("⚠️ Failed to deliver email to {}: {}", email.to, e),
    }
}

// Fire and forget on the current actix runtime
pub fn schedule(mailer: Arc<dyn Mailer>, email: OutgoingEmail) {
    actix_web::rt::spawn(async move {
        deliver(mailer.as_ref(), &email);
    });
}


#[cfg(test)]
mod tests {
    use super::test_support::MemoryMailer;
    use super::*;
    use crate::models::{InvitationStatus, TeamRole};
    use chrono::{TimeZone, Utc};

    struct FailingMailer;

    impl Mailer for FailingMailer {
        fn send(&self, _email: &OutgoingEmail) -> Result<(), ServiceError> {
            Err(ServiceError::InternalServerError)
        }
    }

    fn details() -> InvitationDetails {
        InvitationDetails {
            id: "inv".to_string(),
            team_id: "team".to_string(),
            team_name: Some("Stage Crew".to_string()),
            email: "guest@example.com".to_string(),
            role: TeamRole::Admin,
            invited_by: "ada".to_string(),
            invited_by_name: Some("Ada".to_string()),
            status: InvitationStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            expires_at: Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn invitation_email_links_to_the_token() {
        let email = invitation_email(&details(), "abc123", "https://app.example.com/");

        assert_eq!(email.to, "guest@example.com");
        assert_eq!(email.subject, "You're invited to join Stage Crew");
        assert!(email.body.contains("https://app.example.com/invitations/abc123"));
        assert!(email.body.contains("as admin"));
        assert!(email.body.contains("2024-05-08 12:00 UTC"));
    }

    #[test]
    fn delivery_failures_are_swallowed() {
        let email = invitation_email(&details(), "abc123", "https://app.example.com");
        deliver(&FailingMailer, &email);

        let mailer = MemoryMailer::default();
        deliver(&mailer, &email);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }
}
