//! `addrgroup-merge`: address-duplicate merging and two-level grouping.
//!
//! Pure engine crate: receives parsed rows, returns the grouped output document.
//! No CLI or IO dependencies.

pub mod config;
pub mod dedupe;
pub mod engine;
pub mod error;
pub mod group;
pub mod model;
pub mod naming;
pub mod summary;

pub use config::{AddressMatch, MergeConfig};
pub use engine::run;
pub use error::MergeError;
pub use group::{OutputDocument, Partition};
pub use model::{RawRow, Record, SequenceId};
pub use summary::RunSummary;
