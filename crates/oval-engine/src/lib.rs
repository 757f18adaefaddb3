#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`OvalEngineError`, `EvrError`)
//! - [`config`]: Engine configuration (`EngineConfig`, builder)
//! - [`types`]: Small domain enums (`EvalStatus`, `EntityKind`, `EvrOperation`, check modes)
//! - [`model`]: Definition document model (`Definition`, `Criteria`, tests/objects/states, `OvalDocument`)
//! - [`registry`]: Read-only entity registry with first-match lookups (`Registry`)
//! - [`evr`]: `epoch:version-release` comparator (`compare_evr`, `evr_extract`)
//! - [`context`]: Per-evaluation diagnostic queue (`EvalContext`)
//! - [`criteria`]: Criteria tree interpreter
//! - [`leaf`]: Leaf test evaluation per kind
//! - [`evaluator`]: Definition evaluator with per-definition locking (`OvalEvaluator`)
//! - [`inventory`]: Host fact provider (`SystemInventory`, `StaticInventory`)
//! - [`result`]: Evaluation result records (`EvaluationResult`, `Diagnostic`)
//!
//! # Architecture
//!
//! ```text
//! OvalDocument --> Registry (Arc, read-only)
//!                     |
//!   spawn_blocking --> OvalEvaluator::evaluate(definition)
//!                     |   lock(definition) --> criteria::evaluate
//!                     |                           |-- Criterion --> TestRef::evaluate --> SystemInventory
//!                     |                           |                                   \-> compare_evr
//!                     |                           \-- ExtendDefinition --> evaluate_nested (lock child)
//!                     |
//!                EvalContext::finish --> EvaluationResult --> mpsc --> reporter
//! ```

pub mod config;
pub mod context;
pub mod criteria;
pub mod error;
pub mod evaluator;
pub mod evr;
pub mod inventory;
pub mod leaf;
pub mod model;
pub mod registry;
pub mod result;
pub mod types;

// --- Public API Re-exports ---

// Evaluator (main entry point)
pub use evaluator::OvalEvaluator;

// Configuration
pub use config::{EngineConfig, EngineConfigBuilder};

// Error
pub use error::{EvrError, OvalEngineError};

// Registry & model
pub use model::{
    Criteria, CriteriaNode, Definition, ObjectRef, OvalDocument, OvalEntity, OvalTest, StateRef,
    TestRef,
};
pub use registry::Registry;

// EVR comparator
pub use evr::{compare_evr, evr_extract};

// Context & results
pub use context::EvalContext;
pub use result::{Diagnostic, DiagnosticLevel, EvaluationResult, ResultSender};

// Inventory
pub use inventory::{InstalledPackage, StaticInventory, SystemInventory};

// Types
pub use types::{EntityKind, EvalStatus, EvrOperation, PackageFormat};
