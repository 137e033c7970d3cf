//! Preflight document storage
//!
//! Stores the certificate and medical-certificate photos a student captures,
//! separately from the JSON checklist state:
//!
//! - Binary files are immutable once added (new content creates a new file)
//! - Files are content-addressed by SHA-256, so identical captures deduplicate
//! - Metadata is an explicit, auditable JSON sidecar per file
//! - Checklist state remains valid even when photos are absent
//! - No cross-student namespace exists; each service is scoped to one student
//!
//! ## Storage layout
//!
//! ```text
//! <students_dir>/<s1>/<s2>/<student_id>/
//!     ├── profile.json
//!     ├── checklist.json
//!     └── documents/
//!         └── sha256/
//!             └── ab/
//!                 └── cd/
//!                     ├── abcd9e…        # the photo bytes
//!                     └── abcd9e….json   # metadata sidecar
//! ```

mod documents;

pub use documents::{DocumentKind, DocumentMetadata, DocumentsService};

/// Directory under a student's record holding captured photos.
pub const DOCUMENTS_FOLDER_NAME: &str = "documents";

/// Errors that can occur during document storage operations.
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Students directory does not exist or is not a directory
    #[error("Invalid students directory: {0}")]
    InvalidStudentsDirectory(String),

    /// Student directory does not exist
    #[error("Student not found: {0}")]
    StudentNotFound(String),

    /// Unrecognized document kind string
    #[error("Unknown document kind: {0}")]
    UnknownDocumentKind(String),

    /// File already exists in content-addressed storage (immutability violation)
    #[error("Document with hash {0} already exists in storage")]
    DocumentAlreadyExists(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata sidecar could not be serialized or parsed
    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// Identifier or hash validation error
    #[error("Type error: {0}")]
    Types(#[from] preflight_types::TypeError),
}
