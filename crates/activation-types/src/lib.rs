//! Activation Types - Core types for the activation planner
//!
//! The activation planner decides which named items (plugins, modules, any
//! unit a registry can switch on and off) should be active, and in what
//! order, from a set of conditional rule sources.
//!
//! ## Key Concepts
//!
//! - **ItemSpec**: One item a rule source asks for, with its constraints
//! - **CollectedItem**: An ItemSpec tagged with the collector that produced it
//! - **FieldValue**: Loosely-typed operand of a predicate rule
//! - **ReconciliationDecision**: What happened to one plan entry
//! - **defaults**: The single table of default values every parser consults

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod decision;
pub mod defaults;
pub mod item;
pub mod spec;
pub mod value;

// Re-export main types
pub use decision::{
    ActivationPass, DecisionAction, DecisionReason, ReconciliationDecision, VersionIssue,
};
pub use item::{CollectedItem, CollectorKind, ItemOrigin, TriggerBinding};
pub use spec::{ItemSpec, SpecValidationError};
pub use value::{FieldValue, PredicateOperator, UnknownOperator};
