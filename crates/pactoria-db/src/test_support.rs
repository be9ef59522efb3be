//! Shared test utilities for pactoria-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use pactoria_core::entities::{Company, NewCompany, NewContract, NewUser, User};
    use pactoria_core::enums::{CompanySize, ContractType, UserRole};
    use pactoria_core::identity::AuthIdentity;

    use crate::service::PactoriaService;

    /// Create an in-memory `PactoriaService`.
    pub async fn test_service() -> PactoriaService {
        PactoriaService::new_local(":memory:").await.unwrap()
    }

    pub fn identity_of(user: &User) -> AuthIdentity {
        AuthIdentity {
            user_id: user.id.clone(),
            company_id: user.company_id.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }

    /// Register a company named `name` with an admin `admin@<slug>.co.uk`.
    pub async fn register_company(svc: &PactoriaService, name: &str) -> (Company, AuthIdentity) {
        let slug: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_lowercase();
        let (company, user) = svc
            .register_company(
                NewCompany {
                    name: name.to_string(),
                    registration_number: None,
                    vat_number: None,
                    address: None,
                    industry: None,
                    size: CompanySize::Small,
                },
                NewUser {
                    email: format!("admin@{slug}.co.uk"),
                    full_name: format!("{name} Admin"),
                    password: "password1".into(),
                    role: UserRole::Admin,
                },
                "$argon2id$test",
            )
            .await
            .unwrap();
        let identity = identity_of(&user);
        (company, identity)
    }

    /// Add an active user with `role` directly to a company.
    pub async fn add_member(
        svc: &PactoriaService,
        company_id: &str,
        email: &str,
        role: UserRole,
    ) -> AuthIdentity {
        let user = svc
            .create_user(
                company_id,
                NewUser {
                    email: email.to_string(),
                    full_name: "Team Member".into(),
                    password: "password1".into(),
                    role,
                },
                "$argon2id$test",
            )
            .await
            .unwrap();
        identity_of(&user)
    }

    pub fn new_contract(title: &str) -> NewContract {
        NewContract {
            title: title.to_string(),
            contract_type: ContractType::ServiceAgreement,
            plain_english_input: Some("Website design and build over six weeks".into()),
            client_name: Some("Globex Ltd".into()),
            client_email: Some("buyer@globex.co.uk".into()),
            supplier_name: Some("Acme Digital".into()),
            contract_value: Some(12_000.0),
            currency: None,
            start_date: None,
            end_date: None,
            template_id: None,
        }
    }
}
