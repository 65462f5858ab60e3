//! Configuration records accumulated during onboarding.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Identifier carried by every configuration record: `"<kind>-<uuid>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh id for a record of the given kind.
    pub fn generate(kind: &str) -> Self {
        Self(format!("{kind}-{}", Uuid::new_v4()))
    }

    /// The `<kind>` prefix of the id.
    pub fn kind(&self) -> &str {
        self.0.split_once('-').map(|(kind, _)| kind).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Institution identity and branding, built up by shallow merges.
///
/// Keys are free-form; the profile step only checks `name`,
/// `institution_type` and `email`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstitutionProfile(Map<String, Value>);

impl InstitutionProfile {
    /// Merge `patch` into the profile. Keys in the patch overwrite, all
    /// other keys are kept.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String field, trimmed; `None` when absent, not a string, or blank.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The signature policy stored by the signatures step, if any.
    pub fn signature_policy(&self) -> Option<SignaturePolicy> {
        self.0
            .get(SignaturePolicy::PROFILE_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// A verification service the institution offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fee: Decimal,
    pub turnaround_days: u32,
    #[serde(default)]
    pub required_documents: Vec<String>,
}

impl ServiceRecord {
    pub fn new(name: impl Into<String>, fee: Decimal, turnaround_days: u32) -> Self {
        Self {
            id: RecordId::generate("service"),
            name: name.into(),
            description: String::new(),
            fee,
            turnaround_days,
            required_documents: Vec::new(),
        }
    }
}

/// Output format of a document template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateFormat {
    Pdf,
    Docx,
    Html,
}

impl TemplateFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "html" => Some(Self::Html),
            _ => None,
        }
    }
}

/// A document template, optionally bound to one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<RecordId>,
    pub format: TemplateFormat,
}

impl TemplateRecord {
    pub fn new(name: impl Into<String>, format: TemplateFormat) -> Self {
        Self {
            id: RecordId::generate("template"),
            name: name.into(),
            service_id: None,
            format,
        }
    }

    pub fn for_service(mut self, service_id: RecordId) -> Self {
        self.service_id = Some(service_id);
        self
    }
}

/// A staff role and the permission keys it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RecordId,
    pub name: String,
    pub permissions: Vec<String>,
}

impl RoleRecord {
    pub fn new(name: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            id: RecordId::generate("role"),
            name: name.into(),
            permissions,
        }
    }
}

/// Type of a registry field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Boolean,
    Document,
}

impl FieldKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "boolean" | "bool" => Some(Self::Boolean),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryField {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

/// A data registry and its field schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub id: RecordId,
    pub name: String,
    pub fields: Vec<RegistryField>,
}

impl RegistryRecord {
    pub fn new(name: impl Into<String>, fields: Vec<RegistryField>) -> Self {
        Self {
            id: RecordId::generate("registry"),
            name: name.into(),
            fields,
        }
    }
}

/// How issued documents are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureMode {
    #[default]
    None,
    Single,
    Dual,
}

impl SignatureMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "single" => Some(Self::Single),
            "dual" => Some(Self::Dual),
            _ => None,
        }
    }
}

/// Signature policy chosen in the signatures step.
///
/// Kept inside the profile under [`SignaturePolicy::PROFILE_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignaturePolicy {
    pub mode: SignatureMode,
    #[serde(default)]
    pub signatories: Vec<String>,
    #[serde(default)]
    pub require_seal: bool,
}

impl SignaturePolicy {
    pub const PROFILE_KEY: &'static str = "signature_policy";

    /// Profile patch that stores this policy.
    pub fn to_profile_patch(&self) -> Map<String, Value> {
        let mut patch = Map::new();
        patch.insert(
            Self::PROFILE_KEY.to_string(),
            serde_json::to_value(self).unwrap_or(Value::Null),
        );
        patch
    }
}
