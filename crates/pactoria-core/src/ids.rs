//! ID prefix constants.
//!
//! Every entity id is `<prefix>-<8 hex chars>`, generated by the database
//! layer from `randomblob(4)`.

pub const PREFIX_USER: &str = "usr";
pub const PREFIX_COMPANY: &str = "cmp";
pub const PREFIX_CONTRACT: &str = "ctr";
pub const PREFIX_CONTRACT_VERSION: &str = "cvr";
pub const PREFIX_TEMPLATE: &str = "tpl";
pub const PREFIX_CLAUSE: &str = "cls";
pub const PREFIX_INVITATION: &str = "inv";
pub const PREFIX_NOTIFICATION: &str = "ntf";
pub const PREFIX_AUDIT: &str = "aud";
pub const PREFIX_WIZARD: &str = "wiz";
pub const PREFIX_INTEGRATION: &str = "int";

pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_USER,
    PREFIX_COMPANY,
    PREFIX_CONTRACT,
    PREFIX_CONTRACT_VERSION,
    PREFIX_TEMPLATE,
    PREFIX_CLAUSE,
    PREFIX_INVITATION,
    PREFIX_NOTIFICATION,
    PREFIX_AUDIT,
    PREFIX_WIZARD,
    PREFIX_INTEGRATION,
];

/// Check whether `id` has the expected prefix and an 8-char hex suffix.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
