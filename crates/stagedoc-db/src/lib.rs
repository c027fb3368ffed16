//! Stagedoc Database Library
//!
//! Read-only repositories over the event-management schema: the
//! authorization relation-chain resolver and the document record locator.
//! Optional columns on the `documents` table are handled by a schema adapter
//! resolved once at startup, never re-probed per request.

pub mod access;
pub mod documents;

pub use access::AccessRepository;
pub use documents::{DocumentRepository, DocumentSchema};
