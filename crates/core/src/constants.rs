//! Shared constants for storage layout and well-known checklist items.

/// Directory under the data dir holding per-student records.
pub const STUDENTS_DIR_NAME: &str = "students";

/// Per-student profile file.
pub const PROFILE_FILE_NAME: &str = "profile.json";

/// Per-student checklist completion state file.
pub const CHECKLIST_FILE_NAME: &str = "checklist.json";

/// Checklist item carrying the name printed on the pilot certificate.
pub const CERTIFICATE_NAME_ITEM_ID: &str = "101";

/// Checklist item carrying the name printed on the medical certificate.
pub const MEDICAL_NAME_ITEM_ID: &str = "201";
