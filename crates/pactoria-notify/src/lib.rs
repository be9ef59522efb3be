//! # pactoria-notify
//!
//! Delivery channels for in-app notifications. Persistence lives in
//! `pactoria-db`; this crate only moves already-stored notifications to
//! people.
//!
//! - [`NotificationHub`]: per-user broadcast channels feeding WebSocket
//!   connections
//! - [`WsEvent`] / [`ClientMessage`]: the WebSocket JSON envelope
//! - [`EmailSender`]: stubbed SMTP that logs and records outgoing mail

pub mod email;
pub mod error;
pub mod events;
pub mod hub;

pub use email::{DisabledEmailSender, EmailMessage, EmailSender, LogEmailSender, sender_from_config};
pub use error::NotifyError;
pub use events::{ClientMessage, WsEvent};
pub use hub::NotificationHub;
