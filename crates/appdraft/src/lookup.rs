//! Boundary traits for the external lookup collaborators.
//!
//! Lookups run asynchronously somewhere else; by the time the engine sees
//! them their results are plain synchronous inputs. Both collaborators are
//! optional, the unit types [`NullRegistry`] and [`NullLookup`] stand in when
//! a session runs without them.

use snafu::Snafu;

use crate::{rendering::DetectedDetails, source::RepoKind};

/// Failure of the rendering-detail lookup. Callers degrade to a plain
/// directory with an empty detail, the error never reaches the document.
#[derive(Debug, Snafu)]
#[snafu(display("rendering detail lookup failed: {message}"))]
pub struct LookupError {
    pub message: String,
}

impl LookupError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What a repository registry knows about a URL.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeclaredKind {
    /// The repository is registered with this kind.
    Declared(RepoKind),

    /// The repository is registered but its kind is not declared.
    Unknown,
}

/// Out-of-band repository metadata.
///
/// Returning `None` means the URL is not registered at all, in which case
/// client-side scheme detection stays authoritative.
pub trait RepoRegistry {
    fn declared_kind(&self, repo_url: &str) -> Option<DeclaredKind>;
}

/// Inputs of the rendering-detail lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DetailQuery<'a> {
    pub repo_url: &'a str,
    pub path: Option<&'a str>,
    pub chart: Option<&'a str>,
    pub target_revision: &'a str,
    pub app_name: &'a str,
    pub project: &'a str,
}

/// Server-side detection of the rendering mode for a concrete source
/// location.
pub trait DetailLookup {
    fn app_details(&self, query: &DetailQuery<'_>) -> Result<DetectedDetails, LookupError>;
}

/// Registry stand-in that knows nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRegistry;

impl RepoRegistry for NullRegistry {
    fn declared_kind(&self, _repo_url: &str) -> Option<DeclaredKind> {
        None
    }
}

/// Detail lookup stand-in that detects every location as a plain directory.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLookup;

impl DetailLookup for NullLookup {
    fn app_details(&self, _query: &DetailQuery<'_>) -> Result<DetectedDetails, LookupError> {
        Ok(DetectedDetails::default())
    }
}
