//! Periodic contract expiry scan.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::watch;

use pactoria_core::enums::{ContractStatus, NotificationType};
use pactoria_db::error::DatabaseError;

use crate::fanout;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpiryScan {
    pub expired: usize,
    pub warned: usize,
    pub invitations_expired: u64,
}

/// Expire lapsed contracts and warn about the ones ending soon.
///
/// Each contract gets at most one `contract_expiring` notification.
///
/// # Errors
///
/// Returns the first database error; work done before it is kept.
pub async fn run_expiry_scan(state: &AppState, today: NaiveDate) -> Result<ExpiryScan, DatabaseError> {
    let mut scan = ExpiryScan::default();

    for contract in state.service.mark_expired(today).await? {
        scan.expired += 1;
        fanout::contract_status_changed(state, &contract, ContractStatus::Active).await;
    }

    let window = state.config.server.expiry_warning_days;
    for contract in state.service.expiring_within(today, window).await? {
        if state
            .service
            .notification_exists_for(&contract.created_by, NotificationType::ContractExpiring, &contract.id)
            .await?
        {
            continue;
        }
        let days_left = contract.days_until_end(today).unwrap_or_default();
        fanout::contract_expiring(state, &contract, days_left).await?;
        scan.warned += 1;
    }

    scan.invitations_expired = state.service.expire_stale_invitations(Utc::now()).await?;
    Ok(scan)
}

/// Run [`run_expiry_scan`] every `expiry_scan_interval_secs` until
/// `shutdown` flips to true.
pub async fn expiry_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let period = Duration::from_secs(state.config.server.expiry_scan_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tracing::info!(interval_secs = period.as_secs(), "expiry scanner started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match run_expiry_scan(&state, Utc::now().date_naive()).await {
                    Ok(scan) if scan.expired + scan.warned > 0 || scan.invitations_expired > 0 => {
                        tracing::info!(
                            expired = scan.expired,
                            warned = scan.warned,
                            invitations_expired = scan.invitations_expired,
                            "expiry scan complete"
                        );
                    }
                    Ok(_) => tracing::debug!("expiry scan found nothing to do"),
                    Err(error) => tracing::warn!(%error, "expiry scan failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    tracing::info!("expiry scanner stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Days;
    use pretty_assertions::assert_eq;

    use pactoria_ai::AiService;
    use pactoria_auth::TokenIssuer;
    use pactoria_config::PactoriaConfig;
    use pactoria_core::entities::{NewCompany, NewContract, NewUser};
    use pactoria_core::enums::{CompanySize, ContractType, Priority, UserRole};
    use pactoria_core::pagination::PageRequest;
    use pactoria_core::identity::AuthIdentity;
    use pactoria_db::service::PactoriaService;
    use pactoria_notify::{DisabledEmailSender, EmailSender, LogEmailSender};

    use super::*;

    async fn test_state() -> AppState {
        test_state_with(Arc::new(DisabledEmailSender)).await
    }

    async fn test_state_with(email: Arc<dyn EmailSender>) -> AppState {
        let mut config = PactoriaConfig::default();
        config.ai.use_mock = true;
        config.auth.jwt_secret = "expiry-scan-test-secret".to_string();
        let service = PactoriaService::new_local(":memory:").await.unwrap();
        let tokens = TokenIssuer::from_config(&config.auth).unwrap();
        let ai = AiService::from_config(&config.ai).unwrap();
        AppState::new(config, service, tokens, ai, email)
    }

    async fn admin(state: &AppState) -> AuthIdentity {
        let (_, user) = state
            .service
            .register_company(
                NewCompany {
                    name: "Acme Widgets Ltd".into(),
                    registration_number: None,
                    vat_number: None,
                    address: None,
                    industry: None,
                    size: CompanySize::Small,
                },
                NewUser {
                    email: "owner@acme.co.uk".into(),
                    full_name: "Alex Admin".into(),
                    password: "Sup3rSecret".into(),
                    role: UserRole::Admin,
                },
                "$argon2id$v=19$stub",
            )
            .await
            .unwrap();
        AuthIdentity {
            user_id: user.id,
            company_id: user.company_id,
            email: user.email,
            role: user.role,
        }
    }

    /// An active contract running from 30 days before `today` to `end`.
    async fn active_contract(state: &AppState, actor: &AuthIdentity, today: NaiveDate, end: NaiveDate) -> String {
        let contract = state
            .service
            .create_contract(
                actor,
                NewContract {
                    title: "Office cleaning".into(),
                    contract_type: ContractType::ServiceAgreement,
                    plain_english_input: None,
                    client_name: Some("Globex Ltd".into()),
                    client_email: None,
                    supplier_name: None,
                    contract_value: Some(4_800.0),
                    currency: None,
                    start_date: today.checked_sub_days(Days::new(30)),
                    end_date: Some(end),
                    template_id: None,
                },
            )
            .await
            .unwrap();
        for status in [ContractStatus::Review, ContractStatus::Approved, ContractStatus::Active] {
            state
                .service
                .transition_contract(actor, &contract.id, status)
                .await
                .unwrap();
        }
        contract.id
    }

    #[tokio::test]
    async fn warns_once_then_expires() {
        let state = test_state().await;
        let actor = admin(&state).await;
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let end = today.checked_add_days(Days::new(5)).unwrap();
        let id = active_contract(&state, &actor, today, end).await;

        let first = run_expiry_scan(&state, today).await.unwrap();
        assert_eq!(first.warned, 1);
        assert_eq!(first.expired, 0);

        let second = run_expiry_scan(&state, today).await.unwrap();
        assert_eq!(second.warned, 0);

        let after_end = end.checked_add_days(Days::new(1)).unwrap();
        let third = run_expiry_scan(&state, after_end).await.unwrap();
        assert_eq!(third.expired, 1);
        let contract = state.service.get_contract(&actor.company_id, &id).await.unwrap();
        assert_eq!(contract.status, ContractStatus::Expired);
    }

    #[tokio::test]
    async fn contracts_outside_the_window_are_left_alone() {
        let state = test_state().await;
        let actor = admin(&state).await;
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let end = today.checked_add_days(Days::new(90)).unwrap();
        active_contract(&state, &actor, today, end).await;

        let scan = run_expiry_scan(&state, today).await.unwrap();
        assert_eq!(scan, ExpiryScan::default());
    }

    #[tokio::test]
    async fn expiry_warnings_are_high_priority_and_emailed() {
        let email = Arc::new(LogEmailSender::new("noreply@pactoria.test"));
        let state = test_state_with(email.clone()).await;
        let actor = admin(&state).await;
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let end = today.checked_add_days(Days::new(20)).unwrap();
        active_contract(&state, &actor, today, end).await;

        let scan = run_expiry_scan(&state, today).await.unwrap();
        assert_eq!(scan.warned, 1);

        let page = state
            .service
            .list_notifications(&actor.user_id, false, PageRequest::new(1, 20))
            .await
            .unwrap();
        let warning = page
            .items
            .iter()
            .find(|n| n.notification_type == NotificationType::ContractExpiring)
            .expect("expiry warning stored");
        assert_eq!(warning.priority, Priority::High);

        let sent = email.outbox();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "owner@acme.co.uk");
        assert!(sent[0].subject.contains("expires in 20 days"), "{}", sent[0].subject);
    }
}
