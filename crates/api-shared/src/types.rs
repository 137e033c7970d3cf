//! Wire DTOs for the Preflight REST API.
//!
//! Request/response shapes are kept separate from the core domain types so the
//! wire format can evolve independently of storage. Enumerations are
//! serialized as snake_case strings.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Request to create a student profile.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateStudentReq {
    pub display_name: String,
}

/// A student profile.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentRes {
    /// Canonical identifier: 32 lowercase hex characters.
    pub id: String,
    pub display_name: String,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

/// List of student profiles.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListStudentsRes {
    pub students: Vec<StudentRes>,
}

/// Kind of a checklist item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemKindRes {
    Task,
    CertificateName,
    MedicalName,
}

/// One checklist item with the student's completion state.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemRes {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub kind: ItemKindRes,
    pub completed: bool,
    /// Captured document name, for document-name items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A titled checklist section.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SectionRes {
    pub title: String,
    pub items: Vec<ItemRes>,
}

/// A student's full checklist.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ChecklistRes {
    pub sections: Vec<SectionRes>,
}

/// Request to set or clear an item's completion.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SetCompletedReq {
    pub completed: bool,
}

/// Request to write a document-name value. `null` clears the value.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SetNameReq {
    pub name: Option<String>,
}

/// Discrepancy classification between the two document names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationRes {
    Match,
    MiddleNameOnly,
    General,
    Indeterminate,
}

/// Coordinator lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorStateRes {
    Unevaluated,
    Resolved,
    PendingMiddleNameAck,
    PendingGeneralAck,
    Acknowledged,
}

/// Snapshot of the discrepancy engine for one student.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DiscrepancyRes {
    pub state: CoordinatorStateRes,
    pub classification: ClassificationRes,
    pub certificate_name_gate: bool,
    pub medical_name_gate: bool,
    pub show_general_dialog: bool,
    pub show_middle_name_dialog: bool,
}

/// A discrepancy kind a user can acknowledge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AckKindReq {
    MiddleName,
    General,
}

/// Request to acknowledge a pending discrepancy.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AcknowledgeReq {
    pub kind: AckKindReq,
}

/// Request to run the OCR-text field scrapers.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractReq {
    /// Raw OCR text from a captured document photo.
    pub text: String,
}

/// Best-effort fields scraped from OCR text. Absent fields were not found.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractRes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Metadata for a stored document photo.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentRes {
    /// SHA-256 digest of the content, lowercase hex.
    pub hash: String,
    pub kind: String,
    pub relative_path: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub original_filename: String,
    /// ISO 8601 timestamp.
    pub stored_at: String,
}

/// List of stored document photos for one student.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListDocumentsRes {
    pub documents: Vec<DocumentRes>,
}
