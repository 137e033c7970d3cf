//! The static checklist dataset.
//!
//! The FAA private-pilot requirements checklist ships embedded in the binary
//! as YAML and is parsed once at service construction. Items are identified by
//! stable string ids; the two document-name items are tagged with a dedicated
//! [`ItemKind`] variant so callers never dispatch on item titles.

use crate::{ChecklistError, ChecklistResult};
use serde::{Deserialize, Serialize};

const BUILTIN_DATASET: &str = include_str!("checklist.yaml");

/// What kind of checklist item this is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A plain item the student ticks off manually.
    #[default]
    Task,
    /// Carries the name printed on the pilot certificate; completion is gated
    /// by the discrepancy coordinator.
    CertificateName,
    /// Carries the name printed on the medical certificate; completion is
    /// gated by the discrepancy coordinator.
    MedicalName,
}

impl ItemKind {
    /// True for items whose value is a document name and whose completion is
    /// gate-driven.
    pub fn is_document_name(self) -> bool {
        matches!(self, ItemKind::CertificateName | ItemKind::MedicalName)
    }
}

/// One checklist item definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub kind: ItemKind,
}

/// A titled group of checklist items.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectionDef {
    pub title: String,
    pub items: Vec<ItemDef>,
}

/// The full checklist dataset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChecklistTemplate {
    pub sections: Vec<SectionDef>,
}

impl ChecklistTemplate {
    /// Parses the embedded dataset.
    pub fn load_builtin() -> ChecklistResult<Self> {
        Self::from_yaml(BUILTIN_DATASET)
    }

    /// Parses a dataset from YAML and validates item ids are unique.
    pub fn from_yaml(yaml: &str) -> ChecklistResult<Self> {
        let template: ChecklistTemplate =
            serde_yaml::from_str(yaml).map_err(ChecklistError::TemplateParse)?;

        let mut seen = std::collections::HashSet::new();
        for item in template.items() {
            if !seen.insert(item.id.as_str()) {
                return Err(ChecklistError::InvalidInput(format!(
                    "duplicate checklist item id: {}",
                    item.id
                )));
            }
        }
        Ok(template)
    }

    /// Iterates all items across sections in dataset order.
    pub fn items(&self) -> impl Iterator<Item = &ItemDef> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    pub fn find_item(&self, id: &str) -> Option<&ItemDef> {
        self.items().find(|item| item.id == id)
    }

    /// Returns the id of the single item with the given kind, if present.
    pub fn item_id_for_kind(&self, kind: ItemKind) -> Option<&str> {
        self.items()
            .find(|item| item.kind == kind)
            .map(|item| item.id.as_str())
    }
}
