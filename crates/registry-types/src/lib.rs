//! Shared data model for the registry parsing workspace
//!
//! This crate defines the structured output of a parse call
//! ([`RegistryDocument`] and its entry types), the error taxonomy, and the
//! benchmark record types persisted by the scoring harness.

pub mod benchmark;
pub mod error;
pub mod model;

pub use benchmark::{BenchmarkRecord, FileScore};
pub use error::{NoteSeverity, ParseError, ParseNote};
pub use model::{
    CreditorInfo, EncumbranceEntry, FloorArea, LeaseTerm, LesseeInfo, OwnerInfo, OwnershipEntry,
    PropertyType, RegistryDocument, TitleInfo,
};
