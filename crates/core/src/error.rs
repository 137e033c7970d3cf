#[derive(Debug, thiserror::Error)]
pub enum ChecklistError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("student not found: {0}")]
    StudentNotFound(String),
    #[error("unknown checklist item: {0}")]
    UnknownItem(String),
    #[error("item {0} cannot be completed while the name discrepancy is unresolved")]
    GateBlocked(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create student directory: {0}")]
    StudentDirCreation(std::io::Error),
    #[error("failed to write checklist file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read checklist file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize checklist data: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize checklist data: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to parse checklist template: {0}")]
    TemplateParse(serde_yaml::Error),
}

pub type ChecklistResult<T> = std::result::Result<T, ChecklistError>;
