//! Repository modules for every Pactoria entity.
//!
//! Each module adds methods to `PactoriaService` via `impl PactoriaService`
//! blocks. Company-owned rows are always looked up by id and `company_id`
//! together, so another tenant's id reads as not found.

pub mod analytics;
pub mod audit;
pub mod clauses;
pub mod companies;
pub mod contracts;
pub mod integrations;
pub mod invitations;
pub mod notifications;
pub mod search;
pub mod team;
pub mod templates;
pub mod users;
pub mod wizard;
