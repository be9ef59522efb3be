//! # pactoria-auth
//!
//! Credentials and access control for Pactoria.
//!
//! Argon2id password hashing, HS256 access tokens bound to one issuer, and a
//! permission gate over [`pactoria_core::identity::AuthIdentity`]. Nothing here
//! touches the database; the server wires these into login and its request
//! extractor.

pub mod claims;
pub mod error;
pub mod password;
pub mod permission;
pub mod random;
pub mod token;

pub use claims::Claims;
pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use permission::RequirePermission;
pub use random::generate_token_hex;
pub use token::{AccessToken, TokenIssuer};
