//! # pactoria-core
//!
//! Core types, ID prefixes, validation, and error types for Pactoria.
//!
//! This crate provides the foundational types shared across all Pactoria crates:
//! - Entity structs for all domain objects (companies, contracts, templates, etc.)
//! - Status enums with state machine transitions
//! - Roles and the permission matrix used by the API layer
//! - UK-specific field validation (postcodes, VAT, Companies House numbers)
//! - ID prefix constants
//! - Cross-cutting error types
//! - API request/response shapes shared by the server and its tests

pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod pagination;
pub mod responses;
pub mod validation;
