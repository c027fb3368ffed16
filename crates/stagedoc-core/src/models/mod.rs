//! Domain models

pub mod access;
pub mod document;
pub mod plan;

pub use access::{authorize, AccessBasis, Caller, DocumentOwners};
pub use document::{DocumentRecord, StorageTier};
pub use plan::{Delivery, Disposition, FetchPlan, FetchSource};
