//! Notification fan-out: persist, push to live sockets, and email the
//! high-priority ones.
//!
//! Delivery failures after the row is stored are logged; the caller's
//! request never fails because a socket or mailbox was unreachable.

use pactoria_core::entities::{Contract, NewNotification, Notification};
use pactoria_core::enums::{ContractStatus, EntityType, NotificationType, Priority};
use pactoria_db::error::DatabaseError;
use pactoria_notify::{EmailMessage, WsEvent};

use crate::state::AppState;

/// Compliance below this raises a `compliance_alert`.
pub const LOW_COMPLIANCE_THRESHOLD: f64 = 0.6;

/// Store one notification and deliver it.
///
/// # Errors
///
/// Returns the database error when the notification cannot be stored.
pub async fn notify(state: &AppState, input: NewNotification) -> Result<Notification, DatabaseError> {
    let notification = state.service.create_notification(input).await?;
    deliver(state, &notification).await;
    Ok(notification)
}

/// Like [`notify`] but never fails; for side effects of a request that
/// has already succeeded.
pub async fn notify_quietly(state: &AppState, input: NewNotification) {
    let kind = input.notification_type;
    if let Err(error) = notify(state, input).await {
        tracing::warn!(%error, notification_type = %kind, "failed to store notification");
    }
}

async fn deliver(state: &AppState, notification: &Notification) {
    let user_id = notification.user_id.as_str();
    let reached = state
        .hub
        .publish(user_id, WsEvent::Notification(notification.clone()));
    if reached > 0 {
        match state.service.unread_count(user_id).await {
            Ok(count) => {
                state.hub.publish(user_id, WsEvent::UnreadCount { count });
            }
            Err(error) => tracing::debug!(%error, user_id, "unread count unavailable"),
        }
    }
    tracing::debug!(
        notification_id = %notification.id,
        user_id,
        connections = reached,
        "notification published"
    );

    if !notification.priority.warrants_email() || !state.email.is_enabled() {
        return;
    }
    let recipient = match state.service.get_user(user_id).await {
        Ok(user) => user.email,
        Err(error) => {
            tracing::warn!(%error, user_id, "cannot email notification: user lookup failed");
            return;
        }
    };
    let message = EmailMessage::notification(&recipient, notification, &state.config.general.frontend_url);
    if let Err(error) = state.email.send(&message).await {
        tracing::warn!(%error, notification_id = %notification.id, "notification email failed");
    }
}

fn contract_url(contract: &Contract) -> String {
    format!("/contracts/{}", contract.id)
}

fn about_contract(contract: &Contract, kind: NotificationType, title: String, message: String) -> NewNotification {
    NewNotification::new(&contract.created_by, &contract.company_id, kind, title, message)
        .about(EntityType::Contract, &contract.id)
        .with_action_url(contract_url(contract))
}

pub async fn contract_created(state: &AppState, contract: &Contract) {
    let input = about_contract(
        contract,
        NotificationType::ContractCreated,
        format!("Contract created: {}", contract.title),
        format!("A new {} was created as a draft.", contract.contract_type.label()),
    )
    .with_priority(Priority::Low);
    notify_quietly(state, input).await;
}

pub async fn contract_status_changed(state: &AppState, contract: &Contract, from: ContractStatus) {
    let priority = match contract.status {
        ContractStatus::Terminated | ContractStatus::Expired => Priority::High,
        _ => Priority::Medium,
    };
    let input = about_contract(
        contract,
        NotificationType::ContractStatusChanged,
        format!("{} is now {}", contract.title, contract.status),
        format!("Status changed from {from} to {}.", contract.status),
    )
    .with_priority(priority);
    notify_quietly(state, input).await;
}

pub async fn contract_generated(state: &AppState, contract: &Contract) {
    let input = about_contract(
        contract,
        NotificationType::ContractGenerated,
        format!("Draft ready: {}", contract.title),
        "The AI draft has been generated and is ready for review.".to_string(),
    );
    notify_quietly(state, input).await;
}

/// Raise a `compliance_alert` when `score` is below the threshold.
pub async fn compliance_checked(state: &AppState, contract: &Contract, score: f64) {
    if score >= LOW_COMPLIANCE_THRESHOLD {
        return;
    }
    let input = about_contract(
        contract,
        NotificationType::ComplianceAlert,
        format!("Low compliance score: {}", contract.title),
        format!(
            "UK compliance scored {:.0}%. Review the flagged areas before sending it out.",
            score * 100.0
        ),
    )
    .with_priority(Priority::High);
    notify_quietly(state, input).await;
}

/// Warn the creator that `contract` ends soon. Always high priority, so
/// the warning is emailed as well as pushed.
pub async fn contract_expiring(state: &AppState, contract: &Contract, days_left: i64) -> Result<Notification, DatabaseError> {
    let when = match days_left {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n => format!("in {n} days"),
    };
    let input = about_contract(
        contract,
        NotificationType::ContractExpiring,
        format!("{} expires {when}", contract.title),
        contract.end_date.map_or_else(
            || "This contract is approaching its end date.".to_string(),
            |end| format!("This contract ends on {}.", end.format("%-d %B %Y")),
        ),
    )
    .with_priority(Priority::High);
    notify(state, input).await
}

/// Tell every admin that `member_name` joined.
pub async fn member_joined(state: &AppState, company_id: &str, member_id: &str, member_name: &str) {
    let admins = match state.service.list_admins(company_id).await {
        Ok(admins) => admins,
        Err(error) => {
            tracing::warn!(%error, company_id, "cannot notify admins of new member");
            return;
        }
    };
    for admin in admins.iter().filter(|a| a.id != member_id) {
        let input = NewNotification::new(
            &admin.id,
            company_id,
            NotificationType::TeamMemberJoined,
            format!("{member_name} joined your team"),
            format!("{member_name} accepted their invitation."),
        )
        .about(EntityType::User, member_id)
        .with_action_url("/team");
        notify_quietly(state, input).await;
    }
}
