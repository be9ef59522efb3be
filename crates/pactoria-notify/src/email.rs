//! Outgoing email. Delivery is stubbed: messages are logged and kept in
//! an in-memory outbox instead of being handed to an SMTP server.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use pactoria_config::EmailConfig;
use pactoria_core::entities::{Invitation, Notification};
use pactoria_core::validation;

use crate::error::NotifyError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

fn expiry_date(at: DateTime<Utc>) -> String {
    at.format("%-d %B %Y").to_string()
}

impl EmailMessage {
    /// Invitation to join `company_name`, linking to the accept page.
    #[must_use]
    pub fn invitation(invitation: &Invitation, token: &str, company_name: &str, frontend_url: &str) -> Self {
        let link = format!(
            "{}/invitations/accept?token={token}",
            frontend_url.trim_end_matches('/')
        );
        Self {
            to: invitation.email.clone(),
            subject: format!("You've been invited to join {company_name} on Pactoria"),
            body: format!(
                "Hello,\n\n\
                 You have been invited to join {company_name} on Pactoria as a {}.\n\n\
                 Accept the invitation here:\n{link}\n\n\
                 This invitation expires on {}.\n",
                invitation.role,
                expiry_date(invitation.expires_at)
            ),
        }
    }

    /// Email copy of an in-app notification.
    #[must_use]
    pub fn notification(to: &str, notification: &Notification, frontend_url: &str) -> Self {
        let mut body = format!("{}\n\n{}\n", notification.title, notification.message);
        if let Some(path) = &notification.action_url {
            body.push_str(&format!("\nView in Pactoria: {}{path}\n", frontend_url.trim_end_matches('/')));
        }
        Self {
            to: to.to_string(),
            subject: format!("[Pactoria] {}", notification.title),
            body,
        }
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Whether messages are actually dispatched.
    fn is_enabled(&self) -> bool;

    /// # Errors
    ///
    /// Returns `NotifyError::InvalidRecipient` for a malformed address.
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// Stub SMTP: validates, logs, and records every message.
pub struct LogEmailSender {
    from: String,
    outbox: Mutex<Vec<EmailMessage>>,
}

impl LogEmailSender {
    #[must_use]
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Messages sent so far, oldest first.
    pub fn outbox(&self) -> Vec<EmailMessage> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        validation::email("to", &message.to).map_err(|_| NotifyError::InvalidRecipient(message.to.clone()))?;
        tracing::info!(from = %self.from, to = %message.to, subject = %message.subject, "email sent (stub)");
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}

/// Drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEmailSender;

#[async_trait]
impl EmailSender for DisabledEmailSender {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        tracing::debug!(to = %message.to, subject = %message.subject, "email disabled, not sent");
        Ok(())
    }
}

#[must_use]
pub fn sender_from_config(config: &EmailConfig) -> Arc<dyn EmailSender> {
    if config.enabled {
        Arc::new(LogEmailSender::new(config.from_address.clone()))
    } else {
        Arc::new(DisabledEmailSender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pactoria_core::enums::{InvitationStatus, NotificationType, Priority, UserRole};
    use pretty_assertions::assert_eq;

    fn invitation() -> Invitation {
        Invitation {
            id: "inv-0a0b0c0d".into(),
            company_id: "cmp-01020304".into(),
            email: "new.hire@acme.co.uk".into(),
            role: UserRole::Member,
            token: None,
            status: InvitationStatus::Pending,
            invited_by: "usr-01020304".into(),
            expires_at: Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap(),
            accepted_at: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn invitation_email() {
        let msg = EmailMessage::invitation(&invitation(), "abc123", "Acme Ltd", "https://app.pactoria.co.uk/");
        assert_eq!(msg.to, "new.hire@acme.co.uk");
        assert_eq!(msg.subject, "You've been invited to join Acme Ltd on Pactoria");
        assert!(msg.body.contains("https://app.pactoria.co.uk/invitations/accept?token=abc123"));
        assert!(msg.body.contains("as a member"));
        assert!(msg.body.contains("9 March 2025"));
    }

    #[test]
    fn notification_email_links_action() {
        let notification = Notification {
            id: "ntf-0a0b0c0d".into(),
            user_id: "usr-01020304".into(),
            company_id: "cmp-01020304".into(),
            notification_type: NotificationType::ComplianceAlert,
            priority: Priority::High,
            title: "Low compliance score".into(),
            message: "Website build scored 0.42".into(),
            entity_type: None,
            entity_id: None,
            action_url: Some("/contracts/ctr-01020304".into()),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        let msg = EmailMessage::notification("owner@acme.co.uk", &notification, "https://app.pactoria.co.uk");
        assert_eq!(msg.subject, "[Pactoria] Low compliance score");
        assert!(msg.body.contains("https://app.pactoria.co.uk/contracts/ctr-01020304"));
    }

    #[tokio::test]
    async fn log_sender_records_outbox() {
        let sender = LogEmailSender::new("noreply@pactoria.co.uk");
        let msg = EmailMessage::invitation(&invitation(), "t", "Acme Ltd", "http://localhost:3000");
        sender.send(&msg).await.unwrap();
        assert_eq!(sender.outbox(), vec![msg]);

        let bad = EmailMessage {
            to: "not-an-address".into(),
            subject: "s".into(),
            body: "b".into(),
        };
        assert!(matches!(sender.send(&bad).await, Err(NotifyError::InvalidRecipient(_))));
        assert_eq!(sender.outbox().len(), 1);
    }

    #[test]
    fn config_picks_sender() {
        assert!(!sender_from_config(&EmailConfig::default()).is_enabled());
        let enabled = EmailConfig {
            enabled: true,
            ..EmailConfig::default()
        };
        assert!(sender_from_config(&enabled).is_enabled());
    }
}
