//! Checklist operations over one student's records.
//!
//! `ChecklistService` is the seam between persistence and the discrepancy
//! coordinator. The host owns one [`DiscrepancyCoordinator`] per student and
//! passes it into the operations that need it; the service never holds
//! coordinator state itself. The invariant maintained here is that every write
//! to a document-name value triggers exactly one synchronous evaluation, and
//! the resulting gates are applied to the two document-name items' completion
//! flags before the state is saved.

use crate::checklist::{ChecklistTemplate, ItemDef, ItemKind};
use crate::config::CoreConfig;
use crate::discrepancy::{
    AckOutcome, CoordinatorState, DiscrepancyClassification, DiscrepancyCoordinator,
    DiscrepancyKind, DialogVisibility, GateState, NameSource,
};
use crate::store::{ChecklistState, ChecklistStore, StudentProfile};
use crate::{ChecklistError, ChecklistResult};
use preflight_types::{NonEmptyText, StudentId};
use serde::{Deserialize, Serialize};

/// Snapshot of the discrepancy engine for one student.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyStatus {
    pub state: CoordinatorState,
    pub classification: DiscrepancyClassification,
    pub gates: GateState,
    pub dialogs: DialogVisibility,
}

impl DiscrepancyStatus {
    fn of(coordinator: &DiscrepancyCoordinator) -> Self {
        Self {
            state: coordinator.state(),
            classification: coordinator.classification(),
            gates: coordinator.gates(),
            dialogs: coordinator.dialogs(),
        }
    }
}

/// One checklist item merged with the student's stored state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemView {
    pub id: String,
    pub title: String,
    pub detail: Option<String>,
    pub kind: ItemKind,
    pub completed: bool,
    pub value: Option<String>,
}

/// A checklist section merged with the student's stored state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectionView {
    pub title: String,
    pub items: Vec<ItemView>,
}

/// Reads the two document names out of a stored checklist state.
struct StateNameSource<'a> {
    state: &'a ChecklistState,
    certificate_item: &'a str,
    medical_item: &'a str,
}

impl NameSource for StateNameSource<'_> {
    fn certificate_name(&self) -> Option<String> {
        self.state.value(self.certificate_item)
    }
    fn medical_name(&self) -> Option<String> {
        self.state.value(self.medical_item)
    }
}

/// Checklist business operations - no API concerns.
#[derive(Clone, Debug)]
pub struct ChecklistService {
    store: ChecklistStore,
    template: ChecklistTemplate,
}

impl ChecklistService {
    pub fn new(config: &CoreConfig) -> ChecklistResult<Self> {
        Ok(Self {
            store: ChecklistStore::new(config),
            template: ChecklistTemplate::load_builtin()?,
        })
    }

    pub fn template(&self) -> &ChecklistTemplate {
        &self.template
    }

    pub fn create_student(&self, display_name: NonEmptyText) -> ChecklistResult<StudentProfile> {
        self.store.create_student(display_name)
    }

    pub fn list_students(&self) -> Vec<StudentProfile> {
        self.store.list_students()
    }

    pub fn profile(&self, id: StudentId) -> ChecklistResult<StudentProfile> {
        self.store.load_profile(id)
    }

    /// The dataset merged with the student's stored completion state.
    pub fn checklist(&self, id: StudentId) -> ChecklistResult<Vec<SectionView>> {
        let state = self.store.load_state(id)?;
        Ok(self
            .template
            .sections
            .iter()
            .map(|section| SectionView {
                title: section.title.clone(),
                items: section
                    .items
                    .iter()
                    .map(|def| {
                        let item_state = state.item(&def.id);
                        ItemView {
                            id: def.id.clone(),
                            title: def.title.clone(),
                            detail: def.detail.clone(),
                            kind: def.kind,
                            completed: item_state.completed,
                            value: item_state.value,
                        }
                    })
                    .collect(),
            })
            .collect())
    }

    fn item_def(&self, item_id: &str) -> ChecklistResult<&ItemDef> {
        self.template
            .find_item(item_id)
            .ok_or_else(|| ChecklistError::UnknownItem(item_id.to_owned()))
    }

    /// Sets or clears completion of a plain task item.
    ///
    /// Document-name items are gate-driven: marking one complete is rejected
    /// with [`ChecklistError::GateBlocked`] while its gate is closed, and
    /// allowed (a no-op beyond the flag write) once the gate is open.
    pub fn set_completed(
        &self,
        id: StudentId,
        item_id: &str,
        completed: bool,
        coordinator: &DiscrepancyCoordinator,
    ) -> ChecklistResult<()> {
        let def = self.item_def(item_id)?;
        if completed && def.kind.is_document_name() {
            let gate_open = match def.kind {
                ItemKind::CertificateName => coordinator.gates().certificate_name_gate,
                ItemKind::MedicalName => coordinator.gates().medical_name_gate,
                ItemKind::Task => unreachable!("is_document_name excludes Task"),
            };
            if !gate_open {
                return Err(ChecklistError::GateBlocked(item_id.to_owned()));
            }
        }

        let mut state = self.store.load_state(id)?;
        state.item_mut(item_id).completed = completed;
        self.store.save_state(id, &state)
    }

    /// Writes a document-name value and re-evaluates the discrepancy engine.
    ///
    /// Persists the value, runs exactly one synchronous evaluation against the
    /// updated pair, applies the resulting gates to both document-name items'
    /// completion flags, and saves. Only items tagged as document names accept
    /// a value.
    pub fn set_item_name(
        &self,
        id: StudentId,
        item_id: &str,
        name: Option<String>,
        coordinator: &mut DiscrepancyCoordinator,
    ) -> ChecklistResult<DiscrepancyStatus> {
        let def = self.item_def(item_id)?;
        if !def.kind.is_document_name() {
            return Err(ChecklistError::InvalidInput(format!(
                "item {} does not carry a document name",
                item_id
            )));
        }

        let mut state = self.store.load_state(id)?;
        state.item_mut(item_id).value = name.filter(|n| !n.trim().is_empty());

        self.evaluate_and_apply(id, &mut state, coordinator)?;
        Ok(DiscrepancyStatus::of(coordinator))
    }

    /// Re-runs the evaluation against the stored names.
    ///
    /// Used by hosts to seed a freshly constructed coordinator from persisted
    /// state (for example after a process restart).
    pub fn evaluate(
        &self,
        id: StudentId,
        coordinator: &mut DiscrepancyCoordinator,
    ) -> ChecklistResult<DiscrepancyStatus> {
        let mut state = self.store.load_state(id)?;
        self.evaluate_and_apply(id, &mut state, coordinator)?;
        Ok(DiscrepancyStatus::of(coordinator))
    }

    /// Acknowledges a pending discrepancy, forcing both gates open.
    ///
    /// On [`AckOutcome::NotPending`] nothing is persisted.
    pub fn acknowledge(
        &self,
        id: StudentId,
        kind: DiscrepancyKind,
        coordinator: &mut DiscrepancyCoordinator,
    ) -> ChecklistResult<(AckOutcome, DiscrepancyStatus)> {
        let outcome = coordinator.acknowledge(kind);
        if outcome == AckOutcome::Applied {
            let mut state = self.store.load_state(id)?;
            self.apply_gates(&mut state, coordinator);
            self.store.save_state(id, &state)?;
        }
        Ok((outcome, DiscrepancyStatus::of(coordinator)))
    }

    pub fn discrepancy_status(&self, coordinator: &DiscrepancyCoordinator) -> DiscrepancyStatus {
        DiscrepancyStatus::of(coordinator)
    }

    fn evaluate_and_apply(
        &self,
        id: StudentId,
        state: &mut ChecklistState,
        coordinator: &mut DiscrepancyCoordinator,
    ) -> ChecklistResult<()> {
        let source = StateNameSource {
            state,
            certificate_item: self
                .template
                .item_id_for_kind(ItemKind::CertificateName)
                .unwrap_or(crate::constants::CERTIFICATE_NAME_ITEM_ID),
            medical_item: self
                .template
                .item_id_for_kind(ItemKind::MedicalName)
                .unwrap_or(crate::constants::MEDICAL_NAME_ITEM_ID),
        };
        coordinator.evaluate(&source);
        self.apply_gates(state, coordinator);
        self.store.save_state(id, state)
    }

    /// Overwrites the two document-name items' completion flags from the
    /// gates. Both gates always hold the same value after an evaluation, so
    /// the pair moves together.
    fn apply_gates(&self, state: &mut ChecklistState, coordinator: &DiscrepancyCoordinator) {
        let gates = coordinator.gates();
        if let Some(item_id) = self.template.item_id_for_kind(ItemKind::CertificateName) {
            state.item_mut(item_id).completed = gates.certificate_name_gate;
        }
        if let Some(item_id) = self.template.item_id_for_kind(ItemKind::MedicalName) {
            state.item_mut(item_id).completed = gates.medical_name_gate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CERTIFICATE_NAME_ITEM_ID, MEDICAL_NAME_ITEM_ID};

    fn test_service() -> (tempfile::TempDir, ChecklistService, StudentId) {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::new(dir.path().to_path_buf()).unwrap();
        let service = ChecklistService::new(&config).unwrap();
        let profile = service
            .create_student(NonEmptyText::new("Amelia Earhart").unwrap())
            .unwrap();
        (dir, service, profile.id)
    }

    #[test]
    fn test_matching_names_complete_both_document_items() {
        let (_dir, service, id) = test_service();
        let mut coordinator = DiscrepancyCoordinator::new();

        service
            .set_item_name(
                id,
                CERTIFICATE_NAME_ITEM_ID,
                Some("Amelia Mary Earhart".into()),
                &mut coordinator,
            )
            .unwrap();
        let status = service
            .set_item_name(
                id,
                MEDICAL_NAME_ITEM_ID,
                Some("amelia mary earhart".into()),
                &mut coordinator,
            )
            .unwrap();

        assert_eq!(status.classification, DiscrepancyClassification::Match);
        let sections = service.checklist(id).unwrap();
        let items: Vec<_> = sections.iter().flat_map(|s| s.items.iter()).collect();
        let cert = items
            .iter()
            .find(|i| i.id == CERTIFICATE_NAME_ITEM_ID)
            .unwrap();
        let medical = items
            .iter()
            .find(|i| i.id == MEDICAL_NAME_ITEM_ID)
            .unwrap();
        assert!(cert.completed);
        assert!(medical.completed);
    }

    #[test]
    fn test_discrepancy_blocks_completion_until_acknowledged() {
        let (_dir, service, id) = test_service();
        let mut coordinator = DiscrepancyCoordinator::new();

        service
            .set_item_name(
                id,
                CERTIFICATE_NAME_ITEM_ID,
                Some("John Smith".into()),
                &mut coordinator,
            )
            .unwrap();
        let status = service
            .set_item_name(
                id,
                MEDICAL_NAME_ITEM_ID,
                Some("Jon Smith".into()),
                &mut coordinator,
            )
            .unwrap();
        assert_eq!(status.classification, DiscrepancyClassification::General);
        assert!(status.dialogs.show_general_dialog);

        let err = service
            .set_completed(id, CERTIFICATE_NAME_ITEM_ID, true, &coordinator)
            .expect_err("closed gate should block completion");
        assert!(matches!(err, ChecklistError::GateBlocked(_)));

        let (outcome, status) = service
            .acknowledge(id, DiscrepancyKind::General, &mut coordinator)
            .unwrap();
        assert_eq!(outcome, AckOutcome::Applied);
        assert!(status.gates.certificate_name_gate);
        assert!(!status.dialogs.show_general_dialog);

        // Gates applied to persisted state.
        let sections = service.checklist(id).unwrap();
        let completed_names = sections
            .iter()
            .flat_map(|s| s.items.iter())
            .filter(|i| i.kind.is_document_name() && i.completed)
            .count();
        assert_eq!(completed_names, 2);
    }

    #[test]
    fn test_middle_name_scenario_gates_and_dialog() {
        let (_dir, service, id) = test_service();
        let mut coordinator = DiscrepancyCoordinator::new();

        service
            .set_item_name(
                id,
                CERTIFICATE_NAME_ITEM_ID,
                Some("John Robert Smith".into()),
                &mut coordinator,
            )
            .unwrap();
        let status = service
            .set_item_name(
                id,
                MEDICAL_NAME_ITEM_ID,
                Some("John Smith".into()),
                &mut coordinator,
            )
            .unwrap();

        assert_eq!(
            status.classification,
            DiscrepancyClassification::MiddleNameOnly
        );
        assert!(status.dialogs.show_middle_name_dialog);
        assert!(!status.dialogs.show_general_dialog);
        assert!(!status.gates.certificate_name_gate);
        assert!(!status.gates.medical_name_gate);
    }

    #[test]
    fn test_single_name_is_indeterminate_with_no_dialog() {
        let (_dir, service, id) = test_service();
        let mut coordinator = DiscrepancyCoordinator::new();

        let status = service
            .set_item_name(
                id,
                MEDICAL_NAME_ITEM_ID,
                Some("Jane Doe".into()),
                &mut coordinator,
            )
            .unwrap();
        assert_eq!(
            status.classification,
            DiscrepancyClassification::Indeterminate
        );
        assert_eq!(status.dialogs, DialogVisibility::default());
        assert!(!status.gates.certificate_name_gate);
    }

    #[test]
    fn test_name_edit_after_acknowledgement_rearbitrates() {
        let (_dir, service, id) = test_service();
        let mut coordinator = DiscrepancyCoordinator::new();

        service
            .set_item_name(
                id,
                CERTIFICATE_NAME_ITEM_ID,
                Some("John Smith".into()),
                &mut coordinator,
            )
            .unwrap();
        service
            .set_item_name(
                id,
                MEDICAL_NAME_ITEM_ID,
                Some("Jon Smith".into()),
                &mut coordinator,
            )
            .unwrap();
        service
            .acknowledge(id, DiscrepancyKind::General, &mut coordinator)
            .unwrap();

        // Fixing the medical name resolves the pair outright.
        let status = service
            .set_item_name(
                id,
                MEDICAL_NAME_ITEM_ID,
                Some("John Smith".into()),
                &mut coordinator,
            )
            .unwrap();
        assert_eq!(status.classification, DiscrepancyClassification::Match);
        assert_eq!(status.state, CoordinatorState::Resolved);
    }

    #[test]
    fn test_evaluate_seeds_a_fresh_coordinator_from_storage() {
        let (_dir, service, id) = test_service();
        let mut coordinator = DiscrepancyCoordinator::new();
        service
            .set_item_name(
                id,
                CERTIFICATE_NAME_ITEM_ID,
                Some("John Robert Smith".into()),
                &mut coordinator,
            )
            .unwrap();
        service
            .set_item_name(
                id,
                MEDICAL_NAME_ITEM_ID,
                Some("John Smith".into()),
                &mut coordinator,
            )
            .unwrap();

        // Simulated restart: new coordinator, same storage.
        let mut fresh = DiscrepancyCoordinator::new();
        let status = service.evaluate(id, &mut fresh).unwrap();
        assert_eq!(
            status.classification,
            DiscrepancyClassification::MiddleNameOnly
        );
        assert_eq!(status.state, CoordinatorState::PendingMiddleNameAck);
    }

    #[test]
    fn test_task_items_complete_without_gating() {
        let (_dir, service, id) = test_service();
        let coordinator = DiscrepancyCoordinator::new();
        service.set_completed(id, "601", true, &coordinator).unwrap();
        let sections = service.checklist(id).unwrap();
        let item = sections
            .iter()
            .flat_map(|s| s.items.iter())
            .find(|i| i.id == "601")
            .unwrap();
        assert!(item.completed);
    }

    #[test]
    fn test_value_writes_rejected_for_task_items() {
        let (_dir, service, id) = test_service();
        let mut coordinator = DiscrepancyCoordinator::new();
        let err = service
            .set_item_name(id, "601", Some("John".into()), &mut coordinator)
            .expect_err("task items do not carry names");
        assert!(matches!(err, ChecklistError::InvalidInput(_)));
    }

    #[test]
    fn test_unknown_item_is_rejected() {
        let (_dir, service, id) = test_service();
        let coordinator = DiscrepancyCoordinator::new();
        let err = service
            .set_completed(id, "999", true, &coordinator)
            .expect_err("unknown item should fail");
        assert!(matches!(err, ChecklistError::UnknownItem(_)));
    }
}
