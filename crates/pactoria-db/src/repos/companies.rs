//! Company repository, registration, and seat accounting.

use chrono::Utc;

use pactoria_core::entities::{Address, Company, NewCompany, NewUser, User};
use pactoria_core::enums::{AuditAction, EntityType, UserRole};
use pactoria_core::identity::AuthIdentity;
use pactoria_core::ids::PREFIX_COMPANY;
use pactoria_core::responses::SeatUsage;

use crate::error::DatabaseError;
use crate::helpers::{get_count, get_opt_string, parse_datetime, parse_enum, parse_json, to_json};
use crate::service::{Actor, PactoriaService};
use crate::updates::SetList;
use crate::updates::company::CompanyUpdate;

const SELECT_COLS: &str = "id, name, registration_number, vat_number, address, industry, size, \
                           subscription_tier, created_at, updated_at";

fn row_to_company(row: &libsql::Row) -> Result<Company, DatabaseError> {
    Ok(Company {
        id: row.get(0)?,
        name: row.get(1)?,
        registration_number: get_opt_string(row, 2)?,
        vat_number: get_opt_string(row, 3)?,
        address: get_opt_string(row, 4)?
            .map(|s| parse_json::<Address>(&s))
            .transpose()?,
        industry: get_opt_string(row, 5)?,
        size: parse_enum(&row.get::<String>(6)?)?,
        subscription_tier: parse_enum(&row.get::<String>(7)?)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

fn u32_count(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

impl PactoriaService {
    /// Create a company and its first admin in one transaction.
    ///
    /// The user's role is forced to `admin`. A duplicate email rolls the
    /// whole registration back.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` on invalid input or a duplicate email.
    pub async fn register_company(
        &self,
        company: NewCompany,
        admin: NewUser,
        password_hash: &str,
    ) -> Result<(Company, User), DatabaseError> {
        let company = company.validate()?;
        let admin = NewUser {
            role: UserRole::Admin,
            ..admin
        }
        .validate()?;

        let (company, user) = self
            .write(async {
                let company = self.insert_company(company).await?;
                let user = self.create_user(&company.id, admin, password_hash).await?;
                Ok((company, user))
            })
            .await?;
        tracing::info!(company_id = %company.id, user_id = %user.id, "company registered");
        Ok((company, user))
    }

    async fn insert_company(&self, input: NewCompany) -> Result<Company, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_COMPANY).await?;
        let company = Company {
            id,
            name: input.name,
            registration_number: input.registration_number,
            vat_number: input.vat_number,
            address: input.address,
            industry: input.industry,
            size: input.size,
            subscription_tier: pactoria_core::enums::SubscriptionTier::Starter,
            created_at: now,
            updated_at: now,
        };
        let address = company.address.as_ref().map(to_json).transpose()?;

        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO companies ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
                libsql::params![
                    company.id.as_str(),
                    company.name.as_str(),
                    company.registration_number.as_deref(),
                    company.vat_number.as_deref(),
                    address,
                    company.industry.as_deref(),
                    company.size.as_str(),
                    company.subscription_tier.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        self.record(
            Actor::company(&company.id),
            EntityType::Company,
            &company.id,
            AuditAction::Created,
            Some(&serde_json::json!({"name": company.name})),
        )
        .await?;
        Ok(company)
    }

    /// # Errors
    ///
    /// Returns a `NotFound` core error when no such company exists.
    pub async fn get_company(&self, id: &str) -> Result<Company, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM companies WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("company", id))?;
        row_to_company(&row)
    }

    /// Partially update the caller's company.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` on invalid input, or a business-rule
    /// error when a tier change would leave fewer seats than are in use.
    pub async fn update_company(
        &self,
        actor: &AuthIdentity,
        update: CompanyUpdate,
    ) -> Result<Company, DatabaseError> {
        self.write(async {
            let update = update.validate()?;
            let company_id = actor.company_id.as_str();

            let mut sets = SetList::default();
            if let Some(ref name) = update.name {
                sets.push("name", name.clone());
            }
            if let Some(ref number) = update.registration_number {
                sets.push("registration_number", number.clone());
            }
            if let Some(ref vat) = update.vat_number {
                sets.push("vat_number", vat.clone());
            }
            if let Some(ref address) = update.address {
                sets.push("address", address.as_ref().map(to_json).transpose()?);
            }
            if let Some(ref industry) = update.industry {
                sets.push("industry", industry.clone());
            }
            if let Some(size) = update.size {
                sets.push("size", size.as_str());
            }
            if let Some(tier) = update.subscription_tier {
                let usage = self.seat_usage(company_id).await?;
                if usage.used() > tier.max_users() {
                    return Err(DatabaseError::business_rule(format!(
                        "{} seats are in use but the {tier} tier allows {}",
                        usage.used(),
                        tier.max_users()
                    )));
                }
                sets.push("subscription_tier", tier.as_str());
            }

            if sets.is_empty() {
                return self.get_company(company_id).await;
            }
            sets.push("updated_at", Utc::now().to_rfc3339());
            let (sql, params) = sets.into_update("companies", company_id);
            self.db()
                .conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;

            let updated = self.get_company(company_id).await?;
            self.record(
                actor.into(),
                EntityType::Company,
                company_id,
                AuditAction::Updated,
                Some(&update),
            )
            .await?;
            Ok(updated)
        })
        .await
    }

    /// Active members plus pending invitations against the tier limit.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails or the company is unknown.
    pub async fn seat_usage(&self, company_id: &str) -> Result<SeatUsage, DatabaseError> {
        let company = self.get_company(company_id).await?;
        let active_members = self.count_active_members(company_id).await?;
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*) FROM invitations WHERE company_id = ?1 AND status = 'pending'",
                [company_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let pending = get_count(&row, 0)?;
        Ok(SeatUsage {
            active_members: u32_count(active_members),
            pending_invitations: u32_count(pending),
            max_users: company.max_users(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{register_company, test_service};
    use crate::updates::company::CompanyUpdateBuilder;
    use pactoria_core::enums::{CompanySize, SubscriptionTier};
    use pactoria_core::errors::CoreError;
    use pretty_assertions::assert_eq;

    fn new_company(name: &str) -> NewCompany {
        NewCompany {
            name: name.into(),
            registration_number: Some("12345678".into()),
            vat_number: None,
            address: Some(Address {
                line1: "1 High Street".into(),
                line2: None,
                city: "Leeds".into(),
                postcode: "ls1 4ap".into(),
            }),
            industry: None,
            size: CompanySize::Micro,
        }
    }

    fn owner(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            full_name: "Owner".into(),
            password: "password1".into(),
            role: UserRole::Viewer,
        }
    }

    #[tokio::test]
    async fn registration_creates_company_and_admin() {
        let svc = test_service().await;
        let (company, user) = svc
            .register_company(new_company("Acme Ltd"), owner("owner@acme.co.uk"), "hash")
            .await
            .unwrap();

        assert!(company.id.starts_with("cmp-"));
        assert_eq!(company.subscription_tier, SubscriptionTier::Starter);
        assert_eq!(company.address.as_ref().unwrap().postcode, "LS1 4AP");
        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.company_id, company.id);

        let fetched = svc.get_company(&company.id).await.unwrap();
        assert_eq!(fetched, company);
    }

    #[tokio::test]
    async fn duplicate_registration_rolls_back_company() {
        let svc = test_service().await;
        svc.register_company(new_company("Acme Ltd"), owner("owner@acme.co.uk"), "hash")
            .await
            .unwrap();

        let err = svc
            .register_company(new_company("Acme Again"), owner("OWNER@acme.co.uk"), "hash")
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::BusinessRule(_))));

        let mut rows = svc
            .db()
            .conn()
            .query("SELECT COUNT(*) FROM companies", ())
            .await
            .unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn update_company_partial() {
        let svc = test_service().await;
        let (_, admin) = register_company(&svc, "Acme").await;

        let updated = svc
            .update_company(
                &admin,
                CompanyUpdateBuilder::new()
                    .name("Acme Holdings")
                    .vat_number(Some("GB123456789".into()))
                    .subscription_tier(SubscriptionTier::Professional)
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Acme Holdings");
        assert_eq!(updated.vat_number.as_deref(), Some("GB123456789"));
        assert_eq!(updated.max_users(), 20);
    }

    #[tokio::test]
    async fn seat_usage_counts_members() {
        let svc = test_service().await;
        let (company, _) = register_company(&svc, "Acme").await;
        let usage = svc.seat_usage(&company.id).await.unwrap();
        assert_eq!(usage.active_members, 1);
        assert_eq!(usage.pending_invitations, 0);
        assert_eq!(usage.max_users, 5);
        assert!(usage.has_free_seat());
    }
}
