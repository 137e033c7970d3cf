//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the
//! services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in
//! multi-threaded runtimes and test harnesses.

use crate::constants::STUDENTS_DIR_NAME;
use crate::{ChecklistError, ChecklistResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(data_dir: PathBuf) -> ChecklistResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(ChecklistError::InvalidInput(
                "data_dir cannot be empty".into(),
            ));
        }
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn students_dir(&self) -> PathBuf {
        self.data_dir.join(STUDENTS_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_rejects_empty_data_dir() {
        let err = CoreConfig::new(PathBuf::new()).expect_err("empty path should be rejected");
        assert!(matches!(err, ChecklistError::InvalidInput(msg) if msg.contains("data_dir")));
    }

    #[test]
    fn test_students_dir_is_under_data_dir() {
        let config = CoreConfig::new(PathBuf::from("/preflight_data")).unwrap();
        assert_eq!(
            config.students_dir(),
            PathBuf::from("/preflight_data/students")
        );
    }
}
