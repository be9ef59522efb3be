//! Entity structs for all Pactoria domain objects.
//!
//! Each entity maps to a table in the libSQL database (see
//! `pactoria-db/migrations`). All structs derive `Serialize`, `Deserialize`,
//! and `JsonSchema` for JSON roundtrip and schema validation. `New*` input
//! structs carry the field-level invariants: `validate()` returns a
//! normalized copy or a `CoreError::Validation`.

mod audit;
mod clause;
mod company;
mod contract;
mod integration;
mod invitation;
mod notification;
mod template;
mod user;
mod wizard;

pub use audit::AuditEntry;
pub use clause::{LegalClause, NewClause, normalize_tags};
pub use company::{Address, Company, NewCompany};
pub use contract::{Contract, ContractVersion, DEFAULT_CURRENCY, NewContract};
pub use integration::IntegrationConnection;
pub use invitation::Invitation;
pub use notification::{NewNotification, Notification};
pub use template::{DEFAULT_JURISDICTION, LegalTemplate, NewTemplate, TemplateVariable, placeholders};
pub use user::{NewUser, User};
pub use wizard::{
    WIZARD_STEPS, WizardData, WizardSession, WizardStep1, WizardStep2, WizardStep3,
};
