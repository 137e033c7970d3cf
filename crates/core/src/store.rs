//! Per-student checklist persistence.
//!
//! Each student's records live under a sharded directory derived from their
//! canonical id: `<students_dir>/<s1>/<s2>/<id>/` containing `profile.json`
//! (display name, created-at) and `checklist.json` (item id to completion
//! state). Unparseable records are logged and skipped during listing rather
//! than failing the whole listing.

use crate::config::CoreConfig;
use crate::constants::{CHECKLIST_FILE_NAME, PROFILE_FILE_NAME};
use crate::{ChecklistError, ChecklistResult};
use chrono::{DateTime, Utc};
use preflight_types::{NonEmptyText, StudentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// A student profile as stored in `profile.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Stored state for one checklist item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemState {
    #[serde(default)]
    pub completed: bool,
    /// Captured value for document-name items; `None` for plain tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Stored state for a student's whole checklist, keyed by item id.
///
/// Items absent from the map are uncompleted with no value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChecklistState {
    #[serde(default)]
    pub items: BTreeMap<String, ItemState>,
}

impl ChecklistState {
    pub fn item(&self, id: &str) -> ItemState {
        self.items.get(id).cloned().unwrap_or_default()
    }

    pub fn item_mut(&mut self, id: &str) -> &mut ItemState {
        self.items.entry(id.to_owned()).or_default()
    }

    /// Current value of a document-name item, if any.
    pub fn value(&self, id: &str) -> Option<String> {
        self.items.get(id).and_then(|s| s.value.clone())
    }
}

/// File-system backed store for student profiles and checklist state.
#[derive(Clone, Debug)]
pub struct ChecklistStore {
    students_dir: PathBuf,
}

impl ChecklistStore {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            students_dir: config.students_dir(),
        }
    }

    fn student_dir(&self, id: StudentId) -> PathBuf {
        id.sharded_dir(&self.students_dir)
    }

    /// Creates a new student with an empty checklist and returns the profile.
    pub fn create_student(&self, display_name: NonEmptyText) -> ChecklistResult<StudentProfile> {
        let id = StudentId::new();
        let student_dir = self.student_dir(id);
        fs::create_dir_all(&student_dir).map_err(ChecklistError::StudentDirCreation)?;

        let profile = StudentProfile {
            id,
            display_name: display_name.as_str().to_owned(),
            created_at: Utc::now(),
        };
        let json =
            serde_json::to_string_pretty(&profile).map_err(ChecklistError::Serialization)?;
        fs::write(student_dir.join(PROFILE_FILE_NAME), json)
            .map_err(ChecklistError::FileWrite)?;

        self.save_state(id, &ChecklistState::default())?;
        Ok(profile)
    }

    /// Lists all student profiles.
    ///
    /// Traverses the two-level sharded directory structure and reads every
    /// `profile.json`. A profile that cannot be parsed is logged as a warning
    /// and skipped.
    pub fn list_students(&self) -> Vec<StudentProfile> {
        let mut students = Vec::new();

        let s1_iter = match fs::read_dir(&self.students_dir) {
            Ok(it) => it,
            Err(_) => return students,
        };
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let profile_path = id_ent.path().join(PROFILE_FILE_NAME);
                    if !profile_path.is_file() {
                        continue;
                    }

                    match fs::read_to_string(&profile_path)
                        .map_err(ChecklistError::FileRead)
                        .and_then(|contents| {
                            serde_json::from_str::<StudentProfile>(&contents)
                                .map_err(ChecklistError::Deserialization)
                        }) {
                        Ok(profile) => students.push(profile),
                        Err(e) => {
                            tracing::warn!(
                                "skipping unreadable profile {}: {}",
                                profile_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        students
    }

    pub fn load_profile(&self, id: StudentId) -> ChecklistResult<StudentProfile> {
        let path = self.student_dir(id).join(PROFILE_FILE_NAME);
        if !path.is_file() {
            return Err(ChecklistError::StudentNotFound(id.to_string()));
        }
        let contents = fs::read_to_string(&path).map_err(ChecklistError::FileRead)?;
        serde_json::from_str(&contents).map_err(ChecklistError::Deserialization)
    }

    /// Loads a student's checklist state. A missing state file for an existing
    /// student yields the empty state.
    pub fn load_state(&self, id: StudentId) -> ChecklistResult<ChecklistState> {
        let student_dir = self.student_dir(id);
        if !student_dir.join(PROFILE_FILE_NAME).is_file() {
            return Err(ChecklistError::StudentNotFound(id.to_string()));
        }
        let path = student_dir.join(CHECKLIST_FILE_NAME);
        if !path.is_file() {
            return Ok(ChecklistState::default());
        }
        let contents = fs::read_to_string(&path).map_err(ChecklistError::FileRead)?;
        serde_json::from_str(&contents).map_err(ChecklistError::Deserialization)
    }

    pub fn save_state(&self, id: StudentId, state: &ChecklistState) -> ChecklistResult<()> {
        let student_dir = self.student_dir(id);
        fs::create_dir_all(&student_dir).map_err(ChecklistError::StudentDirCreation)?;
        let json = serde_json::to_string_pretty(state).map_err(ChecklistError::Serialization)?;
        fs::write(student_dir.join(CHECKLIST_FILE_NAME), json)
            .map_err(ChecklistError::FileWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, ChecklistStore) {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::new(dir.path().to_path_buf()).unwrap();
        let store = ChecklistStore::new(&config);
        (dir, store)
    }

    #[test]
    fn test_create_student_writes_profile_and_empty_state() {
        let (_dir, store) = test_store();
        let profile = store
            .create_student(NonEmptyText::new("Amelia Earhart").unwrap())
            .unwrap();
        let loaded = store.load_profile(profile.id).unwrap();
        assert_eq!(loaded.display_name, "Amelia Earhart");
        let state = store.load_state(profile.id).unwrap();
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_state_roundtrips_completion_and_values() {
        let (_dir, store) = test_store();
        let profile = store
            .create_student(NonEmptyText::new("Amelia").unwrap())
            .unwrap();

        let mut state = ChecklistState::default();
        state.item_mut("601").completed = true;
        state.item_mut("101").value = Some("Amelia Mary Earhart".into());
        store.save_state(profile.id, &state).unwrap();

        let loaded = store.load_state(profile.id).unwrap();
        assert!(loaded.item("601").completed);
        assert_eq!(loaded.value("101").as_deref(), Some("Amelia Mary Earhart"));
        assert_eq!(loaded.item("999"), ItemState::default());
    }

    #[test]
    fn test_unknown_student_is_not_found() {
        let (_dir, store) = test_store();
        let id = StudentId::new();
        assert!(matches!(
            store.load_profile(id),
            Err(ChecklistError::StudentNotFound(_))
        ));
        assert!(matches!(
            store.load_state(id),
            Err(ChecklistError::StudentNotFound(_))
        ));
    }

    #[test]
    fn test_list_students_walks_shards_and_skips_garbage() {
        let (_dir, store) = test_store();
        let a = store
            .create_student(NonEmptyText::new("Amelia").unwrap())
            .unwrap();
        let b = store
            .create_student(NonEmptyText::new("Charles").unwrap())
            .unwrap();

        // Corrupt one profile on disk; listing should skip it, not fail.
        let c = store
            .create_student(NonEmptyText::new("Bessie").unwrap())
            .unwrap();
        let bad_path = c
            .id
            .sharded_dir(&store.students_dir)
            .join(PROFILE_FILE_NAME);
        fs::write(&bad_path, "not json").unwrap();

        let listed = store.list_students();
        let ids: Vec<_> = listed.iter().map(|p| p.id).collect();
        assert!(ids.contains(&a.id));
        assert!(ids.contains(&b.id));
        assert!(!ids.contains(&c.id));
    }
}
