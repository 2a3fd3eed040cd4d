//! Activation Registry - The item registry seam
//!
//! The registry is the system of record for which items exist, which version
//! each one is at, and which are currently active. The planner only ever
//! talks to it through [`RegistryView`].
//!
//! ## In-Memory vs Host-Backed
//!
//! The crate provides an in-memory implementation suitable for development
//! and testing. Hosts wrap their own plugin manager in the same trait.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod memory;
pub mod view;

// Re-exports
pub use error::{RegistryError, Result};
pub use memory::{InMemoryRegistry, RegistryOperation};
pub use view::RegistryView;
