//! # Preflight Core
//!
//! Core business logic for the Preflight pilot-training checklist system.
//!
//! This crate contains pure domain logic and file/folder management:
//! - The FAA private-pilot checklist dataset and per-student completion state
//!   with sharded JSON storage
//! - The name-discrepancy engine: normalization, classification, and the
//!   coordinator state machine gating the two document-name items
//! - Best-effort field scrapers for OCR'd certificate text
//!
//! **No API concerns**: HTTP servers, wire DTOs, or service interfaces belong
//! in the root binary and `api-shared`.

pub mod checklist;
pub mod config;
pub mod constants;
pub mod discrepancy;
mod error;
pub mod extraction;
pub mod names;
pub mod service;
pub mod store;

pub use checklist::{ChecklistTemplate, ItemDef, ItemKind, SectionDef};
pub use config::CoreConfig;
pub use discrepancy::{
    classify, AckOutcome, CoordinatorState, DialogVisibility, DiscrepancyClassification,
    DiscrepancyCoordinator, DiscrepancyKind, GateState, NameSource,
};
pub use error::{ChecklistError, ChecklistResult};
pub use service::{ChecklistService, DiscrepancyStatus, ItemView, SectionView};
pub use store::{ChecklistState, ChecklistStore, ItemState, StudentProfile};
