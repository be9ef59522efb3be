//! Status enums, roles, categories, and audit actions for Pactoria.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! Status enums with state machines provide `allowed_next_states()` to enforce
//! valid transitions at the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

/// Implements `Display` and `FromStr` from `as_str()` and the `ALL` table.
macro_rules! impl_str_enum {
    ($ty:ident, $field:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| CoreError::validation($field, format!("unknown value '{s}'")))
            }
        }
    };
}

// ---------------------------------------------------------------------------
// UserRole / Permission
// ---------------------------------------------------------------------------

/// Role of a user within their company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Member,
    Viewer,
}

/// Actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewContracts,
    EditContracts,
    ApproveContracts,
    ManageTemplates,
    InviteMembers,
    ManageTeam,
    ManageCompany,
    ManageIntegrations,
}

impl UserRole {
    pub const ALL: &'static [Self] = &[Self::Admin, Self::Manager, Self::Member, Self::Viewer];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }

    /// Permission matrix.
    ///
    /// ```text
    /// admin   → everything
    /// manager → view, edit, approve, templates, invite
    /// member  → view, edit
    /// viewer  → view
    /// ```
    #[must_use]
    pub const fn has_permission(self, permission: Permission) -> bool {
        match self {
            Self::Admin => true,
            Self::Manager => matches!(
                permission,
                Permission::ViewContracts
                    | Permission::EditContracts
                    | Permission::ApproveContracts
                    | Permission::ManageTemplates
                    | Permission::InviteMembers
            ),
            Self::Member => matches!(
                permission,
                Permission::ViewContracts | Permission::EditContracts
            ),
            Self::Viewer => matches!(permission, Permission::ViewContracts),
        }
    }

    /// Whether a user with this role may grant `target` to someone else.
    #[must_use]
    pub const fn can_assign(self, target: Self) -> bool {
        match self {
            Self::Admin => true,
            Self::Manager => matches!(target, Self::Member | Self::Viewer),
            Self::Member | Self::Viewer => false,
        }
    }
}

impl_str_enum!(UserRole, "role");

impl Permission {
    pub const ALL: &'static [Self] = &[
        Self::ViewContracts,
        Self::EditContracts,
        Self::ApproveContracts,
        Self::ManageTemplates,
        Self::InviteMembers,
        Self::ManageTeam,
        Self::ManageCompany,
        Self::ManageIntegrations,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewContracts => "view_contracts",
            Self::EditContracts => "edit_contracts",
            Self::ApproveContracts => "approve_contracts",
            Self::ManageTemplates => "manage_templates",
            Self::InviteMembers => "invite_members",
            Self::ManageTeam => "manage_team",
            Self::ManageCompany => "manage_company",
            Self::ManageIntegrations => "manage_integrations",
        }
    }
}

impl_str_enum!(Permission, "permission");

// ---------------------------------------------------------------------------
// CompanySize / SubscriptionTier
// ---------------------------------------------------------------------------

/// UK SME size band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Micro,
    Small,
    Medium,
}

impl CompanySize {
    pub const ALL: &'static [Self] = &[Self::Micro, Self::Small, Self::Medium];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Micro => "micro",
            Self::Small => "small",
            Self::Medium => "medium",
        }
    }
}

impl_str_enum!(CompanySize, "company_size");

/// Subscription plan, which caps the number of seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Starter,
    Professional,
    Business,
}

impl SubscriptionTier {
    pub const ALL: &'static [Self] = &[Self::Starter, Self::Professional, Self::Business];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Professional => "professional",
            Self::Business => "business",
        }
    }

    /// Maximum number of active members plus pending invitations.
    #[must_use]
    pub const fn max_users(self) -> u32 {
        match self {
            Self::Starter => 5,
            Self::Professional => 20,
            Self::Business => 100,
        }
    }
}

impl_str_enum!(SubscriptionTier, "subscription_tier");

// ---------------------------------------------------------------------------
// ContractType
// ---------------------------------------------------------------------------

/// Kind of contract. Drives prompt wording and compliance areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    ServiceAgreement,
    EmploymentContract,
    SupplierAgreement,
    Nda,
    TermsAndConditions,
    Consultancy,
    Partnership,
    Lease,
    Other,
}

impl ContractType {
    pub const ALL: &'static [Self] = &[
        Self::ServiceAgreement,
        Self::EmploymentContract,
        Self::SupplierAgreement,
        Self::Nda,
        Self::TermsAndConditions,
        Self::Consultancy,
        Self::Partnership,
        Self::Lease,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServiceAgreement => "service_agreement",
            Self::EmploymentContract => "employment_contract",
            Self::SupplierAgreement => "supplier_agreement",
            Self::Nda => "nda",
            Self::TermsAndConditions => "terms_and_conditions",
            Self::Consultancy => "consultancy",
            Self::Partnership => "partnership",
            Self::Lease => "lease",
            Self::Other => "other",
        }
    }

    /// Human-readable name used in prompts and emails.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ServiceAgreement => "Service Agreement",
            Self::EmploymentContract => "Employment Contract",
            Self::SupplierAgreement => "Supplier Agreement",
            Self::Nda => "Non-Disclosure Agreement",
            Self::TermsAndConditions => "Terms and Conditions",
            Self::Consultancy => "Consultancy Agreement",
            Self::Partnership => "Partnership Agreement",
            Self::Lease => "Lease Agreement",
            Self::Other => "Contract",
        }
    }
}

impl_str_enum!(ContractType, "contract_type");

// ---------------------------------------------------------------------------
// ContractStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a contract.
///
/// ```text
/// draft → review → approved → active → completed
///   ↑       │          │         → terminated
///   └───────┘          │         → expired
/// draft → terminated   → terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Draft,
    Review,
    Approved,
    Active,
    Completed,
    Terminated,
    Expired,
}

impl ContractStatus {
    pub const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Review,
        Self::Approved,
        Self::Active,
        Self::Completed,
        Self::Terminated,
        Self::Expired,
    ];

    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Review, Self::Terminated],
            Self::Review => &[Self::Draft, Self::Approved],
            Self::Approved => &[Self::Active, Self::Terminated],
            Self::Active => &[Self::Completed, Self::Terminated, Self::Expired],
            Self::Completed | Self::Terminated | Self::Expired => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Content may only be edited before approval.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft | Self::Review)
    }

    /// Moving into these states needs the approve permission.
    #[must_use]
    pub const fn requires_approval_rights(self) -> bool {
        matches!(self, Self::Approved | Self::Active)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Terminated => "terminated",
            Self::Expired => "expired",
        }
    }
}

impl_str_enum!(ContractStatus, "status");

// ---------------------------------------------------------------------------
// TemplateStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a legal template.
///
/// ```text
/// draft → review → approved → active → deprecated
///   ↑       │
///   └───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStatus {
    Draft,
    Review,
    Approved,
    Active,
    Deprecated,
}

impl TemplateStatus {
    pub const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Review,
        Self::Approved,
        Self::Active,
        Self::Deprecated,
    ];

    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Review],
            Self::Review => &[Self::Draft, Self::Approved],
            Self::Approved => &[Self::Active],
            Self::Active => &[Self::Deprecated],
            Self::Deprecated => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft | Self::Review)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Deprecated => "deprecated",
        }
    }
}

impl_str_enum!(TemplateStatus, "status");

// ---------------------------------------------------------------------------
// ClauseStatus / ClauseCategory / RiskLevel
// ---------------------------------------------------------------------------

/// Lifecycle of a clause in the clause library.
///
/// ```text
/// draft → approved → deprecated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClauseStatus {
    Draft,
    Approved,
    Deprecated,
}

impl ClauseStatus {
    pub const ALL: &'static [Self] = &[Self::Draft, Self::Approved, Self::Deprecated];

    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Approved],
            Self::Approved => &[Self::Deprecated],
            Self::Deprecated => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Deprecated => "deprecated",
        }
    }
}

impl_str_enum!(ClauseStatus, "status");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClauseCategory {
    Liability,
    Termination,
    Payment,
    Confidentiality,
    IntellectualProperty,
    DataProtection,
    DisputeResolution,
    ForceMajeure,
    General,
}

impl ClauseCategory {
    pub const ALL: &'static [Self] = &[
        Self::Liability,
        Self::Termination,
        Self::Payment,
        Self::Confidentiality,
        Self::IntellectualProperty,
        Self::DataProtection,
        Self::DisputeResolution,
        Self::ForceMajeure,
        Self::General,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Liability => "liability",
            Self::Termination => "termination",
            Self::Payment => "payment",
            Self::Confidentiality => "confidentiality",
            Self::IntellectualProperty => "intellectual_property",
            Self::DataProtection => "data_protection",
            Self::DisputeResolution => "dispute_resolution",
            Self::ForceMajeure => "force_majeure",
            Self::General => "general",
        }
    }
}

impl_str_enum!(ClauseCategory, "category");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: &'static [Self] = &[Self::Low, Self::Medium, Self::High, Self::Critical];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Band a 1–10 risk score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            Self::Critical
        } else if score >= 6.0 {
            Self::High
        } else if score >= 4.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl_str_enum!(RiskLevel, "risk_level");

// ---------------------------------------------------------------------------
// VariableType
// ---------------------------------------------------------------------------

/// Type of a template variable; checked when a template is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Text,
    Number,
    Date,
    Currency,
    Email,
    Boolean,
}

impl VariableType {
    pub const ALL: &'static [Self] = &[
        Self::Text,
        Self::Number,
        Self::Date,
        Self::Currency,
        Self::Email,
        Self::Boolean,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Currency => "currency",
            Self::Email => "email",
            Self::Boolean => "boolean",
        }
    }
}

impl_str_enum!(VariableType, "var_type");

// ---------------------------------------------------------------------------
// InvitationStatus
// ---------------------------------------------------------------------------

/// Status of a team invitation.
///
/// ```text
/// pending → accepted
///         → expired
///         → revoked
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
    Revoked,
}

impl InvitationStatus {
    pub const ALL: &'static [Self] = &[Self::Pending, Self::Accepted, Self::Expired, Self::Revoked];

    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Expired, Self::Revoked],
            Self::Accepted | Self::Expired | Self::Revoked => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

impl_str_enum!(InvitationStatus, "status");

// ---------------------------------------------------------------------------
// NotificationType / Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ContractCreated,
    ContractStatusChanged,
    ContractGenerated,
    ContractExpiring,
    ComplianceAlert,
    TeamInvitation,
    TeamMemberJoined,
    System,
}

impl NotificationType {
    pub const ALL: &'static [Self] = &[
        Self::ContractCreated,
        Self::ContractStatusChanged,
        Self::ContractGenerated,
        Self::ContractExpiring,
        Self::ComplianceAlert,
        Self::TeamInvitation,
        Self::TeamMemberJoined,
        Self::System,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContractCreated => "contract_created",
            Self::ContractStatusChanged => "contract_status_changed",
            Self::ContractGenerated => "contract_generated",
            Self::ContractExpiring => "contract_expiring",
            Self::ComplianceAlert => "compliance_alert",
            Self::TeamInvitation => "team_invitation",
            Self::TeamMemberJoined => "team_member_joined",
            Self::System => "system",
        }
    }
}

impl_str_enum!(NotificationType, "notification_type");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: &'static [Self] = &[Self::Low, Self::Medium, Self::High, Self::Urgent];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// High and urgent notifications are also sent by email.
    #[must_use]
    pub const fn warrants_email(self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }
}

impl_str_enum!(Priority, "priority");

// ---------------------------------------------------------------------------
// WizardStatus
// ---------------------------------------------------------------------------

/// Status of a contract-wizard session.
///
/// ```text
/// in_progress → completed
///             → abandoned
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WizardStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl WizardStatus {
    pub const ALL: &'static [Self] = &[Self::InProgress, Self::Completed, Self::Abandoned];

    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::InProgress => &[Self::Completed, Self::Abandoned],
            Self::Completed | Self::Abandoned => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl_str_enum!(WizardStatus, "status");

// ---------------------------------------------------------------------------
// IntegrationProvider / IntegrationStatus
// ---------------------------------------------------------------------------

/// Third-party services a company can connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationProvider {
    Xero,
    Quickbooks,
    Docusign,
    Hubspot,
    Slack,
    GoogleDrive,
    #[serde(rename = "microsoft_365")]
    Microsoft365,
}

impl IntegrationProvider {
    pub const ALL: &'static [Self] = &[
        Self::Xero,
        Self::Quickbooks,
        Self::Docusign,
        Self::Hubspot,
        Self::Slack,
        Self::GoogleDrive,
        Self::Microsoft365,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Xero => "xero",
            Self::Quickbooks => "quickbooks",
            Self::Docusign => "docusign",
            Self::Hubspot => "hubspot",
            Self::Slack => "slack",
            Self::GoogleDrive => "google_drive",
            Self::Microsoft365 => "microsoft_365",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Xero => "Xero",
            Self::Quickbooks => "QuickBooks",
            Self::Docusign => "DocuSign",
            Self::Hubspot => "HubSpot",
            Self::Slack => "Slack",
            Self::GoogleDrive => "Google Drive",
            Self::Microsoft365 => "Microsoft 365",
        }
    }

    #[must_use]
    pub const fn category(self) -> &'static str {
        match self {
            Self::Xero | Self::Quickbooks => "accounting",
            Self::Docusign => "e_signature",
            Self::Hubspot => "crm",
            Self::Slack => "communication",
            Self::GoogleDrive | Self::Microsoft365 => "document_storage",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Xero => "Sync contract values and invoices with Xero",
            Self::Quickbooks => "Sync contract values and invoices with QuickBooks",
            Self::Docusign => "Send approved contracts for electronic signature",
            Self::Hubspot => "Link contracts to HubSpot companies and deals",
            Self::Slack => "Post contract notifications to a Slack channel",
            Self::GoogleDrive => "Archive final contracts to Google Drive",
            Self::Microsoft365 => "Archive final contracts to OneDrive / SharePoint",
        }
    }
}

impl_str_enum!(IntegrationProvider, "provider");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    Connected,
    Disconnected,
    Error,
}

impl IntegrationStatus {
    pub const ALL: &'static [Self] = &[Self::Connected, Self::Disconnected, Self::Error];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

impl_str_enum!(IntegrationStatus, "status");

// ---------------------------------------------------------------------------
// AuditAction / EntityType
// ---------------------------------------------------------------------------

/// Type of action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    StatusChanged,
    Generated,
    Analyzed,
    Invited,
    Joined,
    RoleChanged,
    Removed,
    Connected,
    Disconnected,
}

impl AuditAction {
    pub const ALL: &'static [Self] = &[
        Self::Created,
        Self::Updated,
        Self::Deleted,
        Self::StatusChanged,
        Self::Generated,
        Self::Analyzed,
        Self::Invited,
        Self::Joined,
        Self::RoleChanged,
        Self::Removed,
        Self::Connected,
        Self::Disconnected,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::StatusChanged => "status_changed",
            Self::Generated => "generated",
            Self::Analyzed => "analyzed",
            Self::Invited => "invited",
            Self::Joined => "joined",
            Self::RoleChanged => "role_changed",
            Self::Removed => "removed",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

impl_str_enum!(AuditAction, "action");

/// Type of entity in the system, used in the audit trail and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Company,
    Contract,
    Template,
    Clause,
    Invitation,
    Notification,
    Wizard,
    Integration,
}

impl EntityType {
    pub const ALL: &'static [Self] = &[
        Self::User,
        Self::Company,
        Self::Contract,
        Self::Template,
        Self::Clause,
        Self::Invitation,
        Self::Notification,
        Self::Wizard,
        Self::Integration,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Company => "company",
            Self::Contract => "contract",
            Self::Template => "template",
            Self::Clause => "clause",
            Self::Invitation => "invitation",
            Self::Notification => "notification",
            Self::Wizard => "wizard",
            Self::Integration => "integration",
        }
    }
}

impl_str_enum!(EntityType, "entity_type");
