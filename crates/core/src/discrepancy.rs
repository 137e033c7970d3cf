//! Name-discrepancy classification and the coordinator state machine.
//!
//! Two checklist items carry document names: the pilot certificate name
//! (item `101`) and the medical certificate name (item `201`). Whenever either
//! value changes, the host re-evaluates the pair. The classification gates
//! both items' completion and selects which confirmation dialog, if any, the
//! host should present. Users can acknowledge a discrepancy to proceed; the
//! underlying names are left untouched, so a later evaluation re-arbitrates.

use crate::names::{has_general_discrepancy, has_middle_name_asymmetry, names_match};
use serde::{Deserialize, Serialize};

/// Relationship between a certificate name and a medical-certificate name.
///
/// Exactly one of `Match`, `MiddleNameOnly`, `General` holds for any pair of
/// present names; `Indeterminate` means at least one name is not yet captured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyClassification {
    /// Normalized token sequences are identical.
    Match,
    /// The certificate name carries extra interior tokens; first and last
    /// tokens agree with the medical name.
    MiddleNameOnly,
    /// The names differ in a way not explained by a missing middle name.
    General,
    /// Either name is absent.
    Indeterminate,
}

/// Classifies a (certificate name, medical name) pair.
///
/// The middle-name check runs before the general check. Reversing the order
/// would misclassify a legitimate middle-name case as `General`, since any
/// middle-name pair also fails naive equality.
pub fn classify(
    certificate_name: Option<&str>,
    medical_name: Option<&str>,
) -> DiscrepancyClassification {
    if certificate_name.is_none() || medical_name.is_none() {
        return DiscrepancyClassification::Indeterminate;
    }
    if has_middle_name_asymmetry(certificate_name, medical_name) {
        return DiscrepancyClassification::MiddleNameOnly;
    }
    if has_general_discrepancy(certificate_name, medical_name) {
        return DiscrepancyClassification::General;
    }
    DiscrepancyClassification::Match
}

/// A discrepancy kind a user can acknowledge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    MiddleName,
    General,
}

/// Result of an acknowledgement attempt.
///
/// `NotPending` is a recoverable no-op: acknowledging a discrepancy that is
/// not currently pending must never open the gates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckOutcome {
    Applied,
    NotPending,
}

/// Coordinator lifecycle state for one (certificate, medical) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    /// Initial, or at least one name absent.
    Unevaluated,
    /// Names match; gates open, no dialog.
    Resolved,
    /// Middle-name discrepancy awaiting acknowledgement.
    PendingMiddleNameAck,
    /// General discrepancy awaiting acknowledgement.
    PendingGeneralAck,
    /// User accepted a discrepancy; gates forced open, names unchanged.
    Acknowledged,
}

/// Completion gates for the two document-name items.
///
/// A discrepancy concerns both documents jointly, so the pair is set and
/// cleared together; after any evaluation both fields hold the same value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateState {
    pub certificate_name_gate: bool,
    pub medical_name_gate: bool,
}

/// Which discrepancy dialog, if any, the host should present.
///
/// At most one flag is true at any time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogVisibility {
    pub show_general_dialog: bool,
    pub show_middle_name_dialog: bool,
}

/// Source of the two name values the coordinator reads on each evaluation.
///
/// The coordinator does not own the names; the host supplies an accessor over
/// its checklist-item collection (item `101` and item `201`).
pub trait NameSource {
    fn certificate_name(&self) -> Option<String>;
    fn medical_name(&self) -> Option<String>;
}

/// Drives gates and dialog flags from the current name pair.
///
/// `evaluate` must be called exactly once, synchronously, after each write to
/// either name. All outputs are overwritten in one pass, so callers never
/// observe a torn intermediate state. The coordinator itself is not
/// synchronized; a multi-threaded host must confine it to one task or guard
/// it with a single mutex.
#[derive(Clone, Debug)]
pub struct DiscrepancyCoordinator {
    state: CoordinatorState,
    classification: DiscrepancyClassification,
    gates: GateState,
    dialogs: DialogVisibility,
}

impl Default for DiscrepancyCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscrepancyCoordinator {
    pub fn new() -> Self {
        Self {
            state: CoordinatorState::Unevaluated,
            classification: DiscrepancyClassification::Indeterminate,
            gates: GateState::default(),
            dialogs: DialogVisibility::default(),
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Most recent classification, exposed for diagnostics.
    pub fn classification(&self) -> DiscrepancyClassification {
        self.classification
    }

    pub fn gates(&self) -> GateState {
        self.gates
    }

    pub fn dialogs(&self) -> DialogVisibility {
        self.dialogs
    }

    /// Re-reads both names and re-arbitrates gates and dialog flags.
    ///
    /// Overwrites any prior state, including `Acknowledged` — new input always
    /// re-arbitrates. Idempotent for unchanged inputs. When either name is
    /// absent the gates are left as they were (no discrepancy is judgeable
    /// yet) and both dialogs are cleared.
    pub fn evaluate(&mut self, source: &impl NameSource) -> DiscrepancyClassification {
        let certificate_name = source.certificate_name();
        let medical_name = source.medical_name();
        let classification = classify(certificate_name.as_deref(), medical_name.as_deref());

        self.classification = classification;
        match classification {
            DiscrepancyClassification::Indeterminate => {
                self.state = CoordinatorState::Unevaluated;
                self.dialogs = DialogVisibility::default();
            }
            DiscrepancyClassification::Match => {
                self.state = CoordinatorState::Resolved;
                self.gates = GateState {
                    certificate_name_gate: true,
                    medical_name_gate: true,
                };
                self.dialogs = DialogVisibility::default();
            }
            DiscrepancyClassification::MiddleNameOnly => {
                self.state = CoordinatorState::PendingMiddleNameAck;
                self.gates = GateState::default();
                self.dialogs = DialogVisibility {
                    show_general_dialog: false,
                    show_middle_name_dialog: true,
                };
            }
            DiscrepancyClassification::General => {
                self.state = CoordinatorState::PendingGeneralAck;
                self.gates = GateState::default();
                self.dialogs = DialogVisibility {
                    show_general_dialog: true,
                    show_middle_name_dialog: false,
                };
            }
        }
        classification
    }

    /// Acknowledges the pending middle-name discrepancy.
    ///
    /// From `PendingMiddleNameAck`: forces both gates open, clears the dialog,
    /// moves to `Acknowledged`. From any other state: no-op, reported as
    /// [`AckOutcome::NotPending`].
    pub fn acknowledge_middle_name(&mut self) -> AckOutcome {
        self.acknowledge(DiscrepancyKind::MiddleName)
    }

    /// Acknowledges the pending general discrepancy. See
    /// [`Self::acknowledge_middle_name`].
    pub fn acknowledge_general(&mut self) -> AckOutcome {
        self.acknowledge(DiscrepancyKind::General)
    }

    pub fn acknowledge(&mut self, kind: DiscrepancyKind) -> AckOutcome {
        let expected = match kind {
            DiscrepancyKind::MiddleName => CoordinatorState::PendingMiddleNameAck,
            DiscrepancyKind::General => CoordinatorState::PendingGeneralAck,
        };
        if self.state != expected {
            tracing::warn!(
                ?kind,
                state = ?self.state,
                "ignoring acknowledgement: no matching pending discrepancy"
            );
            return AckOutcome::NotPending;
        }
        self.state = CoordinatorState::Acknowledged;
        self.gates = GateState {
            certificate_name_gate: true,
            medical_name_gate: true,
        };
        self.dialogs = DialogVisibility::default();
        AckOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair(Option<&'static str>, Option<&'static str>);

    impl NameSource for Pair {
        fn certificate_name(&self) -> Option<String> {
            self.0.map(str::to_owned)
        }
        fn medical_name(&self) -> Option<String> {
            self.1.map(str::to_owned)
        }
    }

    #[test]
    fn test_classify_indeterminate_when_either_name_absent() {
        assert_eq!(
            classify(None, Some("Jane Doe")),
            DiscrepancyClassification::Indeterminate
        );
        assert_eq!(
            classify(Some("Jane Doe"), None),
            DiscrepancyClassification::Indeterminate
        );
    }

    #[test]
    fn test_classify_match() {
        assert_eq!(
            classify(Some("Smith, John Robert"), Some("Smith, John Robert")),
            DiscrepancyClassification::Match
        );
    }

    #[test]
    fn test_classify_middle_name_takes_precedence_over_general() {
        // Fails naive equality but must land in the middle-name bucket.
        assert_eq!(
            classify(Some("John Robert Smith"), Some("John Smith")),
            DiscrepancyClassification::MiddleNameOnly
        );
    }

    #[test]
    fn test_classify_general() {
        assert_eq!(
            classify(Some("John Smith"), Some("Jon Smith")),
            DiscrepancyClassification::General
        );
    }

    #[test]
    fn test_classify_is_a_partition_for_present_names() {
        let pairs = [
            ("John Smith", "John Smith"),
            ("John Robert Smith", "John Smith"),
            ("John Smith", "Jon Smith"),
            ("Smith", "Smith"),
            ("Smith Smith", "Smith"),
            ("O'Brien, Mary Jane", "O'Brien, Mary"),
        ];
        for (a, b) in pairs {
            let buckets = [
                names_matches(a, b),
                crate::names::has_middle_name_asymmetry(Some(a), Some(b)),
                crate::names::has_general_discrepancy(Some(a), Some(b)),
            ];
            assert_eq!(
                buckets.iter().filter(|&&x| x).count(),
                1,
                "exactly one bucket must hold for ({a}, {b})"
            );
        }
    }

    fn names_matches(a: &str, b: &str) -> bool {
        crate::names::names_match(Some(a), Some(b))
    }

    #[test]
    fn test_punctuation_only_differences_classify_as_match() {
        assert_eq!(
            classify(Some("SMITH, JOHN R."), Some("smith john r")),
            DiscrepancyClassification::Match
        );
    }

    #[test]
    fn test_apostrophe_preserved_middle_name_regression() {
        // Apostrophes survive normalization on both sides, so the first and
        // last tokens still align.
        assert_eq!(
            classify(Some("Mary Jane O'Brien"), Some("Mary O'Brien")),
            DiscrepancyClassification::MiddleNameOnly
        );
    }

    #[test]
    fn test_evaluate_match_opens_gates_without_dialogs() {
        let mut coordinator = DiscrepancyCoordinator::new();
        let source = Pair(Some("Smith, John Robert"), Some("Smith, John Robert"));
        assert_eq!(
            coordinator.evaluate(&source),
            DiscrepancyClassification::Match
        );
        assert_eq!(coordinator.state(), CoordinatorState::Resolved);
        assert!(coordinator.gates().certificate_name_gate);
        assert!(coordinator.gates().medical_name_gate);
        assert_eq!(coordinator.dialogs(), DialogVisibility::default());
    }

    #[test]
    fn test_evaluate_middle_name_closes_gates_and_shows_dialog() {
        let mut coordinator = DiscrepancyCoordinator::new();
        let source = Pair(Some("John Robert Smith"), Some("John Smith"));
        coordinator.evaluate(&source);
        assert_eq!(coordinator.state(), CoordinatorState::PendingMiddleNameAck);
        assert!(!coordinator.gates().certificate_name_gate);
        assert!(!coordinator.gates().medical_name_gate);
        assert!(coordinator.dialogs().show_middle_name_dialog);
        assert!(!coordinator.dialogs().show_general_dialog);
    }

    #[test]
    fn test_evaluate_general_shows_general_dialog_only() {
        let mut coordinator = DiscrepancyCoordinator::new();
        coordinator.evaluate(&Pair(Some("John Smith"), Some("Jon Smith")));
        assert_eq!(coordinator.state(), CoordinatorState::PendingGeneralAck);
        assert!(coordinator.dialogs().show_general_dialog);
        assert!(!coordinator.dialogs().show_middle_name_dialog);
    }

    #[test]
    fn test_evaluate_indeterminate_leaves_gates_clears_dialogs() {
        let mut coordinator = DiscrepancyCoordinator::new();
        coordinator.evaluate(&Pair(Some("Jane Doe"), Some("Jane Doe")));
        assert!(coordinator.gates().certificate_name_gate);

        coordinator.evaluate(&Pair(None, Some("Jane Doe")));
        assert_eq!(coordinator.state(), CoordinatorState::Unevaluated);
        assert_eq!(
            coordinator.classification(),
            DiscrepancyClassification::Indeterminate
        );
        // Gates keep their prior value; no discrepancy is judgeable yet.
        assert!(coordinator.gates().certificate_name_gate);
        assert!(coordinator.gates().medical_name_gate);
        assert_eq!(coordinator.dialogs(), DialogVisibility::default());
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut coordinator = DiscrepancyCoordinator::new();
        let source = Pair(Some("John Robert Smith"), Some("John Smith"));
        coordinator.evaluate(&source);
        let first = coordinator.clone();
        coordinator.evaluate(&source);
        assert_eq!(coordinator.state(), first.state());
        assert_eq!(coordinator.gates(), first.gates());
        assert_eq!(coordinator.dialogs(), first.dialogs());
    }

    #[test]
    fn test_gate_atomicity_across_transitions() {
        let mut coordinator = DiscrepancyCoordinator::new();
        let sources = [
            Pair(Some("Jane Doe"), Some("Jane Doe")),
            Pair(Some("John Robert Smith"), Some("John Smith")),
            Pair(Some("John Smith"), Some("Jon Smith")),
            Pair(None, Some("Jane Doe")),
        ];
        for source in &sources {
            coordinator.evaluate(source);
            let gates = coordinator.gates();
            assert_eq!(gates.certificate_name_gate, gates.medical_name_gate);
        }
    }

    #[test]
    fn test_acknowledge_general_opens_gates_and_clears_dialog() {
        let mut coordinator = DiscrepancyCoordinator::new();
        coordinator.evaluate(&Pair(Some("John Smith"), Some("Jon Smith")));
        assert_eq!(coordinator.acknowledge_general(), AckOutcome::Applied);
        assert_eq!(coordinator.state(), CoordinatorState::Acknowledged);
        assert!(coordinator.gates().certificate_name_gate);
        assert!(coordinator.gates().medical_name_gate);
        assert!(!coordinator.dialogs().show_general_dialog);
        // Classification is still reported for diagnostics.
        assert_eq!(
            coordinator.classification(),
            DiscrepancyClassification::General
        );
    }

    #[test]
    fn test_acknowledge_middle_name_from_pending_state() {
        let mut coordinator = DiscrepancyCoordinator::new();
        coordinator.evaluate(&Pair(Some("John Robert Smith"), Some("John Smith")));
        assert_eq!(coordinator.acknowledge_middle_name(), AckOutcome::Applied);
        assert!(!coordinator.dialogs().show_middle_name_dialog);
        assert!(coordinator.gates().certificate_name_gate);
        assert!(coordinator.gates().medical_name_gate);
    }

    #[test]
    fn test_acknowledge_wrong_kind_is_a_noop() {
        let mut coordinator = DiscrepancyCoordinator::new();
        coordinator.evaluate(&Pair(Some("John Smith"), Some("Jon Smith")));
        assert_eq!(
            coordinator.acknowledge_middle_name(),
            AckOutcome::NotPending
        );
        assert_eq!(coordinator.state(), CoordinatorState::PendingGeneralAck);
        assert!(!coordinator.gates().certificate_name_gate);
        assert!(coordinator.dialogs().show_general_dialog);
    }

    #[test]
    fn test_acknowledge_without_pending_discrepancy_is_a_noop() {
        let mut coordinator = DiscrepancyCoordinator::new();
        assert_eq!(coordinator.acknowledge_general(), AckOutcome::NotPending);
        assert_eq!(coordinator.state(), CoordinatorState::Unevaluated);
        assert!(!coordinator.gates().certificate_name_gate);
    }

    #[test]
    fn test_reevaluation_overwrites_acknowledged_state() {
        let mut coordinator = DiscrepancyCoordinator::new();
        coordinator.evaluate(&Pair(Some("John Smith"), Some("Jon Smith")));
        coordinator.acknowledge_general();

        // Names unchanged: the latent discrepancy is re-flagged on the next
        // evaluation. Acknowledgement is not permanent.
        coordinator.evaluate(&Pair(Some("John Smith"), Some("Jon Smith")));
        assert_eq!(coordinator.state(), CoordinatorState::PendingGeneralAck);
        assert!(!coordinator.gates().certificate_name_gate);
        assert!(coordinator.dialogs().show_general_dialog);
    }
}
