//! End-to-end repository workflows through the public service API.
//!
//! - Registration, invitation, and acceptance
//! - A contract through its lifecycle with versions and audit
//! - Tenant isolation across every company-owned entity

use chrono::Utc;
use pretty_assertions::assert_eq;

use pactoria_core::entities::{NewClause, NewCompany, NewContract, NewUser};
use pactoria_core::enums::{
    AuditAction, ClauseCategory, CompanySize, ContractStatus, ContractType, EntityType, RiskLevel,
    UserRole,
};
use pactoria_core::errors::CoreError;
use pactoria_core::identity::AuthIdentity;
use pactoria_core::pagination::PageRequest;
use pactoria_db::error::DatabaseError;
use pactoria_db::repos::audit::AuditFilter;
use pactoria_db::repos::invitations::NewInvitation;
use pactoria_db::repos::search::ContractSearch;
use pactoria_db::service::PactoriaService;
use pactoria_db::updates::contract::ContractUpdateBuilder;

async fn test_service() -> PactoriaService {
    PactoriaService::new_local(":memory:").await.unwrap()
}

async fn register(svc: &PactoriaService, name: &str, email: &str) -> AuthIdentity {
    let (_, user) = svc
        .register_company(
            NewCompany {
                name: name.into(),
                registration_number: None,
                vat_number: None,
                address: None,
                industry: Some("Professional services".into()),
                size: CompanySize::Small,
            },
            NewUser {
                email: email.into(),
                full_name: format!("{name} Owner"),
                password: "correct horse 7".into(),
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

fn contract(title: &str) -> NewContract {
    NewContract {
        title: title.into(),
        contract_type: ContractType::Consultancy,
        plain_english_input: Some("Three months of data engineering support".into()),
        client_name: Some("Initech plc".into()),
        client_email: None,
        supplier_name: None,
        contract_value: Some(30_000.0),
        currency: None,
        start_date: None,
        end_date: None,
        template_id: None,
    }
}

fn is_not_found(err: &DatabaseError) -> bool {
    matches!(err.as_core(), Some(CoreError::NotFound { .. }))
}

#[tokio::test]
async fn invited_member_joins_company() {
    let svc = test_service().await;
    let admin = register(&svc, "Acme Ltd", "owner@acme.co.uk").await;

    let invitation = svc
        .create_invitation(
            &admin,
            NewInvitation {
                email: "analyst@acme.co.uk".into(),
                role: UserRole::Viewer,
                token: "a1b2c3".into(),
                ttl_days: 7,
            },
        )
        .await
        .unwrap();
    let (user, _) = svc
        .accept_invitation("a1b2c3", "Ann Analyst", "password99", "$argon2id$v=19$stub")
        .await
        .unwrap();
    assert_eq!(user.role, UserRole::Viewer);

    let members = svc.list_members(&admin.company_id).await.unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].role, UserRole::Admin);

    let joined = svc
        .query_audit(&AuditFilter {
            company_id: Some(admin.company_id.clone()),
            action: Some(AuditAction::Joined),
            ..AuditFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0].entity_id, user.id);

    let invited = svc
        .query_audit(&AuditFilter {
            entity_type: Some(EntityType::Invitation),
            entity_id: Some(invitation.id),
            ..AuditFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(invited[0].action, AuditAction::Invited);
}

#[tokio::test]
async fn contract_lifecycle_with_versions() {
    let svc = test_service().await;
    let admin = register(&svc, "Acme Ltd", "owner@acme.co.uk").await;
    let c = svc.create_contract(&admin, contract("Data support")).await.unwrap();

    svc.update_contract(
        &admin,
        &c.id,
        ContractUpdateBuilder::new()
            .final_content(Some("1. Services. The consultant shall...".into()))
            .build(),
    )
    .await
    .unwrap();
    let updated = svc
        .update_contract(
            &admin,
            &c.id,
            ContractUpdateBuilder::new()
                .final_content(Some("1. Services. The consultant will...".into()))
                .change_summary("wording")
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(svc.list_versions(&admin.company_id, &c.id).await.unwrap().len(), 2);

    for status in [ContractStatus::Review, ContractStatus::Approved, ContractStatus::Active] {
        svc.transition_contract(&admin, &c.id, status).await.unwrap();
    }
    let err = svc
        .update_contract(&admin, &c.id, ContractUpdateBuilder::new().title("Late edit").build())
        .await
        .unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::BusinessRule(_))));
    let err = svc.delete_contract(&admin, &c.id).await.unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::BusinessRule(_))));

    let transitions = svc
        .query_audit(&AuditFilter {
            entity_id: Some(c.id.clone()),
            action: Some(AuditAction::StatusChanged),
            ..AuditFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(transitions.len(), 3);
    assert_eq!(transitions[0].detail.as_ref().unwrap()["to"], "active");
}

#[tokio::test]
async fn tenants_never_see_each_other() {
    let svc = test_service().await;
    let acme = register(&svc, "Acme Ltd", "owner@acme.co.uk").await;
    let globex = register(&svc, "Globex Ltd", "owner@globex.co.uk").await;

    let c = svc.create_contract(&acme, contract("Acme secret")).await.unwrap();
    let clause = svc
        .create_clause(
            &acme,
            NewClause {
                title: "Liability cap".into(),
                category: ClauseCategory::Liability,
                content: "Liability is capped.".into(),
                risk_level: RiskLevel::High,
                tags: vec![],
                is_mandatory: true,
            },
        )
        .await
        .unwrap();
    let wizard = svc.start_wizard(&acme).await.unwrap();

    assert!(is_not_found(&svc.get_contract(&globex.company_id, &c.id).await.unwrap_err()));
    assert!(is_not_found(
        &svc.transition_contract(&globex, &c.id, ContractStatus::Review)
            .await
            .unwrap_err()
    ));
    assert!(is_not_found(&svc.delete_contract(&globex, &c.id).await.unwrap_err()));
    assert!(is_not_found(&svc.list_versions(&globex.company_id, &c.id).await.unwrap_err()));
    assert!(is_not_found(&svc.get_clause(&globex.company_id, &clause.id).await.unwrap_err()));
    assert!(is_not_found(&svc.get_wizard(&globex, &wizard.id).await.unwrap_err()));
    assert!(is_not_found(
        &svc.remove_member(&globex, &acme.user_id).await.unwrap_err()
    ));

    let found = svc
        .search_contracts(
            &globex.company_id,
            &ContractSearch {
                text: Some("secret".into()),
                ..ContractSearch::default()
            },
            PageRequest::new(1, 20),
        )
        .await
        .unwrap();
    assert_eq!(found.total, 0);

    let stats = svc.dashboard(&globex.company_id, Utc::now().date_naive()).await.unwrap();
    assert_eq!(stats.total_contracts, 0);
}
