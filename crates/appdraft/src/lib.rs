//! Field-reconciliation engine for deployable application drafts.
//!
//! Keeps an application document internally consistent while it is edited
//! incrementally through partial, conflicting or ambiguous inputs. The source
//! and destination of the document are mutually exclusive field unions; the
//! engine collapses them to exactly one authoritative representation, infers
//! intent from which fields were touched, and delivers a debounced stream of
//! normalized documents to an external observer.

pub mod coalesce;
pub mod crd;
pub mod destination;
pub mod logging;
pub mod lookup;
pub mod merge;
pub mod rendering;
pub mod session;
pub mod source;
pub mod validation;

pub use crate::{crd::Application, session::EditSession};
