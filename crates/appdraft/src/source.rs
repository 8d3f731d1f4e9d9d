//! Collapses the source union to exactly one representation.
//!
//! A source is identified either by `path` (git, OCI) or by `chart` (helm).
//! The document format allows both fields to coexist, so every render pass
//! funnels the source through [`normalize_source`] with the kind that is
//! currently authoritative.

use tracing::debug;

use crate::crd::{ApplicationSource, DEFAULT_REVISION};

/// URL scheme prefix that unambiguously marks an OCI registry.
pub const OCI_SCHEME_PREFIX: &str = "oci://";

/// The kind of repository a source points at. Derived, never stored in the
/// document.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum RepoKind {
    #[default]
    Git,
    Helm,
    Oci,
}

/// An explicit user choice of repository kind.
///
/// The choice describes the URL it was made for and loses its authority the
/// moment the URL changes again.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KindChoice {
    pub kind: RepoKind,
    pub repo_url: String,
}

impl KindChoice {
    pub fn applies_to(&self, repo_url: &str) -> bool {
        self.repo_url == repo_url
    }
}

/// Determines the repository kind from the document alone.
///
/// The OCI scheme marker wins over everything, a populated `chart` field marks
/// a chart repository, anything else is git.
pub fn detect_kind(source: &ApplicationSource) -> RepoKind {
    if source.repo_url.starts_with(OCI_SCHEME_PREFIX) {
        RepoKind::Oci
    } else if source.chart.is_some() {
        RepoKind::Helm
    } else {
        RepoKind::Git
    }
}

/// Migrates the source to the representation of `target`.
///
/// Switching into git or OCI moves an existing chart name into `path` and
/// resets the revision to the symbolic latest marker. Switching into helm
/// moves an existing path into `chart` and clears the revision so the user
/// has to pick a version. Idempotent: a second call with the same target is a
/// no-op.
///
/// Returns whether the document was mutated.
pub fn normalize_source(source: &mut ApplicationSource, target: RepoKind) -> bool {
    let current = detect_kind(source);
    if current == target {
        return repair_exclusivity(source, target);
    }

    match target {
        RepoKind::Git | RepoKind::Oci => {
            if let Some(chart) = source.chart.take() {
                source.path = Some(chart);
            }
            source.target_revision = DEFAULT_REVISION.to_owned();
        }
        RepoKind::Helm => {
            if let Some(path) = source.path.take() {
                source.chart = Some(path);
            }
            source.target_revision = String::new();
        }
    }

    debug!(%current, %target, "migrated source representation");
    true
}

/// Restores mutual exclusivity when both identifying fields are populated.
///
/// Only reachable through raw-document merges, the structured editing path
/// can never produce this state. The field that does not belong to `kind` is
/// dropped.
fn repair_exclusivity(source: &mut ApplicationSource, kind: RepoKind) -> bool {
    if source.path.is_none() || source.chart.is_none() {
        return false;
    }
    match kind {
        RepoKind::Helm => source.path = None,
        RepoKind::Git | RepoKind::Oci => source.chart = None,
    }
    debug!(%kind, "dropped the non-authoritative source identifier");
    true
}

/// Last-used repository URLs, one slot per URL family.
///
/// Git and helm repositories share a slot, OCI registries have their own.
/// Restoring an empty OCI slot yields the bare scheme prefix so the URL field
/// never regresses to an empty string.
#[derive(Clone, Debug, Default)]
pub struct UrlHistory {
    git_or_helm: String,
    oci: String,
}

impl UrlHistory {
    pub fn record(&mut self, kind: RepoKind, repo_url: &str) {
        match kind {
            RepoKind::Git | RepoKind::Helm => self.git_or_helm = repo_url.to_owned(),
            RepoKind::Oci => self.oci = repo_url.to_owned(),
        }
    }

    pub fn restore(&self, kind: RepoKind) -> String {
        match kind {
            RepoKind::Git | RepoKind::Helm => self.git_or_helm.clone(),
            RepoKind::Oci if self.oci.is_empty() => OCI_SCHEME_PREFIX.to_owned(),
            RepoKind::Oci => self.oci.clone(),
        }
    }
}

/// Performs an explicit, user-initiated kind switch.
///
/// On top of [`normalize_source`] this remembers the URL the user leaves
/// behind and restores the last URL used with the target kind, so toggling
/// back and forth never loses an entered URL.
pub fn switch_kind(
    source: &mut ApplicationSource,
    history: &mut UrlHistory,
    target: RepoKind,
) -> bool {
    let current = detect_kind(source);
    if current == target {
        return false;
    }

    history.record(current, &source.repo_url);
    normalize_source(source, target);
    source.repo_url = history.restore(target);
    true
}
