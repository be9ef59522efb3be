//! Serde roundtrip and JsonSchema validation tests for the entity types.

use chrono::{NaiveDate, Utc};
use pactoria_core::entities::*;
use pactoria_core::enums::*;
use pactoria_core::responses::*;
use schemars::schema_for;
use serde_json::json;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

roundtrip_and_validate!(
    company_roundtrip,
    Company,
    Company {
        id: "cmp-a3f8b2c1".into(),
        name: "Acme Widgets Ltd".into(),
        registration_number: Some("12345678".into()),
        vat_number: Some("GB123456789".into()),
        address: Some(Address {
            line1: "1 High Street".into(),
            line2: None,
            city: "Leeds".into(),
            postcode: "LS1 4AP".into(),
        }),
        industry: Some("Manufacturing".into()),
        size: CompanySize::Small,
        subscription_tier: SubscriptionTier::Professional,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    contract_roundtrip,
    Contract,
    Contract {
        id: "ctr-0b1c2d3e".into(),
        company_id: "cmp-a3f8b2c1".into(),
        template_id: None,
        title: "Website build".into(),
        contract_type: ContractType::ServiceAgreement,
        status: ContractStatus::Review,
        plain_english_input: Some("Build a website".into()),
        client_name: Some("Globex Ltd".into()),
        client_email: Some("legal@globex.co.uk".into()),
        supplier_name: None,
        contract_value: Some(12_500.5),
        currency: "GBP".into(),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        end_date: NaiveDate::from_ymd_opt(2025, 12, 31),
        generated_content: Some("SERVICE AGREEMENT".into()),
        final_content: None,
        compliance_score: Some(0.82),
        risk_score: Some(3.0),
        ai_model: Some("gpt-4o-mini".into()),
        version: 2,
        created_by: "usr-00000001".into(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    template_roundtrip,
    LegalTemplate,
    LegalTemplate {
        id: "tpl-1234abcd".into(),
        company_id: None,
        name: "Mutual NDA".into(),
        category: ContractType::Nda,
        description: Some("Standard mutual non-disclosure agreement".into()),
        content: "Between {{party_a}} and {{party_b}}".into(),
        variables: vec![TemplateVariable {
            name: "party_a".into(),
            label: "First party".into(),
            var_type: VariableType::Text,
            required: true,
            default_value: None,
            description: None,
        }],
        status: TemplateStatus::Active,
        version: 1,
        jurisdiction: "England and Wales".into(),
        created_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    clause_roundtrip,
    LegalClause,
    LegalClause {
        id: "cls-0000beef".into(),
        company_id: "cmp-a3f8b2c1".into(),
        title: "Force majeure".into(),
        category: ClauseCategory::ForceMajeure,
        content: "Neither party shall be liable for delay...".into(),
        risk_level: RiskLevel::Medium,
        status: ClauseStatus::Approved,
        tags: vec!["delay".into()],
        is_mandatory: false,
        created_by: "usr-00000001".into(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    notification_roundtrip,
    Notification,
    Notification {
        id: "ntf-00c0ffee".into(),
        user_id: "usr-00000001".into(),
        company_id: "cmp-a3f8b2c1".into(),
        notification_type: NotificationType::ContractExpiring,
        priority: Priority::High,
        title: "Contract expiring".into(),
        message: "Website build ends in 14 days".into(),
        entity_type: Some(EntityType::Contract),
        entity_id: Some("ctr-0b1c2d3e".into()),
        action_url: Some("/contracts/ctr-0b1c2d3e".into()),
        is_read: false,
        read_at: None,
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    wizard_roundtrip,
    WizardSession,
    WizardSession {
        id: "wiz-00000002".into(),
        company_id: "cmp-a3f8b2c1".into(),
        user_id: "usr-00000001".into(),
        current_step: 2,
        status: WizardStatus::InProgress,
        data: WizardData {
            step1: Some(WizardStep1 {
                title: "Supply deal".into(),
                contract_type: ContractType::SupplierAgreement,
                plain_english_input: None,
                template_id: None,
            }),
            step2: None,
            step3: None,
        },
        contract_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    audit_roundtrip,
    AuditEntry,
    AuditEntry {
        id: "aud-12345678".into(),
        company_id: Some("cmp-a3f8b2c1".into()),
        user_id: Some("usr-00000001".into()),
        entity_type: EntityType::Contract,
        entity_id: "ctr-0b1c2d3e".into(),
        action: AuditAction::StatusChanged,
        detail: Some(json!({"from": "draft", "to": "review"})),
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    integration_info_roundtrip,
    IntegrationInfo,
    IntegrationInfo::from_catalog(IntegrationProvider::Docusign, None)
);

#[test]
fn enum_serialization_is_snake_case() {
    assert_eq!(
        serde_json::to_value(ContractType::TermsAndConditions).unwrap(),
        json!("terms_and_conditions")
    );
    assert_eq!(
        serde_json::to_value(IntegrationProvider::Microsoft365).unwrap(),
        json!("microsoft_365")
    );
    assert_eq!(
        serde_json::to_value(WizardStatus::InProgress).unwrap(),
        json!("in_progress")
    );
}

#[test]
fn as_str_matches_serde_for_every_variant() {
    for v in ContractStatus::ALL {
        assert_eq!(serde_json::to_value(v).unwrap(), json!(v.as_str()));
    }
    for v in IntegrationProvider::ALL {
        assert_eq!(serde_json::to_value(v).unwrap(), json!(v.as_str()));
    }
    for v in AuditAction::ALL {
        assert_eq!(serde_json::to_value(v).unwrap(), json!(v.as_str()));
    }
    for v in NotificationType::ALL {
        assert_eq!(serde_json::to_value(v).unwrap(), json!(v.as_str()));
    }
}
