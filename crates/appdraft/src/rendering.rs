//! Reconciles the source's rendering mode with its detail sub-object.
//!
//! Four mutually exclusive strategies turn source content into deployable
//! output. The detail payload of each strategy shares no fields with the
//! others, so switching the mode always constructs a fresh empty detail
//! instead of attempting a partial carry-over.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crd::ApplicationSource;

/// Strategy for turning source content into deployable output.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize,
    strum::Display, strum::EnumString,
)]
pub enum RenderingMode {
    #[default]
    Directory,
    Helm,
    Kustomize,
    Plugin,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmDetail {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub value_files: Vec<String>,

    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub parameters: Vec<HelmParameter>,

    #[serde(default)]
    pub file_parameters: Vec<HelmFileParameter>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmParameter {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub value: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmFileParameter {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub path: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KustomizeDetail {
    #[serde(default)]
    pub path: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDetail {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub env: Vec<PluginEnv>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginEnv {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub value: String,
}

/// An empty marker object, a plain directory needs no configuration.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct DirectoryDetail {}

/// Tagged counterpart of the four optional detail sub-objects.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RenderingDetail {
    Directory(DirectoryDetail),
    Helm(HelmDetail),
    Kustomize(KustomizeDetail),
    Plugin(PluginDetail),
}

impl RenderingDetail {
    /// The mode this detail belongs to. Tag and mode are the same thing.
    pub fn mode(&self) -> RenderingMode {
        match self {
            Self::Directory(_) => RenderingMode::Directory,
            Self::Helm(_) => RenderingMode::Helm,
            Self::Kustomize(_) => RenderingMode::Kustomize,
            Self::Plugin(_) => RenderingMode::Plugin,
        }
    }

    /// An empty detail of the given mode's shape.
    pub fn empty(mode: RenderingMode) -> Self {
        match mode {
            RenderingMode::Directory => Self::Directory(DirectoryDetail::default()),
            RenderingMode::Helm => Self::Helm(HelmDetail::default()),
            RenderingMode::Kustomize => Self::Kustomize(KustomizeDetail::default()),
            RenderingMode::Plugin => Self::Plugin(PluginDetail::default()),
        }
    }
}

impl Default for RenderingDetail {
    fn default() -> Self {
        Self::empty(RenderingMode::default())
    }
}

/// Rendering mode and detail payload as reported by the detail lookup
/// collaborator for a concrete source location.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DetectedDetails {
    pub mode: RenderingMode,

    /// Path context the detection ran against, carried through reshaping.
    pub path: Option<String>,

    pub detail: RenderingDetail,
}

/// A user override of the rendering mode, recorded against the exact `path`
/// it was issued for. The override is void once the path changes, it
/// describes a decision about that specific path only.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathTypeOverride {
    pub path: Option<String>,
    pub mode: RenderingMode,
}

/// The mode that is in effect: a still-applicable user override wins over the
/// server-detected mode.
pub fn effective_mode(
    detected: RenderingMode,
    override_choice: Option<&PathTypeOverride>,
    current_path: Option<&str>,
) -> RenderingMode {
    match override_choice {
        Some(choice) if choice.path.as_deref() == current_path => choice.mode,
        _ => detected,
    }
}

/// Aligns a lookup payload with the effective mode.
///
/// On a tag mismatch the detail is replaced wholesale by the empty shape of
/// the effective mode; the path context survives.
pub fn reshape(mut details: DetectedDetails, mode: RenderingMode) -> DetectedDetails {
    if details.mode != mode {
        debug!(detected = %details.mode, effective = %mode, "reshaping rendering detail");
        details.detail = RenderingDetail::empty(mode);
        details.mode = mode;
    }
    details
}

/// Strips detail sub-objects from the source that the given mode does not
/// recognize. Used by the explicit mode-switch menu so that, for example,
/// switching to a plain directory removes leftover helm configuration.
pub fn retag(source: &mut ApplicationSource, mode: RenderingMode) {
    if mode != RenderingMode::Helm {
        source.helm = None;
    }
    if mode != RenderingMode::Kustomize {
        source.kustomize = None;
    }
    if mode != RenderingMode::Directory {
        source.directory = None;
    }
    if mode != RenderingMode::Plugin {
        source.plugin = None;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn reshape_replaces_detail_wholesale() {
        let details = DetectedDetails {
            mode: RenderingMode::Directory,
            path: Some("apps/guestbook".to_owned()),
            detail: RenderingDetail::Directory(DirectoryDetail::default()),
        };

        let reshaped = reshape(details, RenderingMode::Helm);
        assert_eq!(reshaped.mode, RenderingMode::Helm);
        assert_eq!(reshaped.detail, RenderingDetail::Helm(HelmDetail::default()));
        assert_eq!(reshaped.path.as_deref(), Some("apps/guestbook"));
    }

    #[test]
    fn reshape_keeps_matching_detail() {
        let detail = RenderingDetail::Helm(HelmDetail {
            name: "guestbook".to_owned(),
            value_files: vec!["values-prod.yaml".to_owned()],
            ..HelmDetail::default()
        });
        let details = DetectedDetails {
            mode: RenderingMode::Helm,
            path: None,
            detail: detail.clone(),
        };

        assert_eq!(reshape(details, RenderingMode::Helm).detail, detail);
    }

    #[rstest]
    #[case::matching_path(Some("apps/guestbook"), RenderingMode::Plugin)]
    #[case::changed_path(Some("apps/other"), RenderingMode::Kustomize)]
    #[case::cleared_path(None, RenderingMode::Kustomize)]
    fn override_applies_only_to_its_path(
        #[case] current_path: Option<&str>,
        #[case] expected: RenderingMode,
    ) {
        let choice = PathTypeOverride {
            path: Some("apps/guestbook".to_owned()),
            mode: RenderingMode::Plugin,
        };

        assert_eq!(
            effective_mode(RenderingMode::Kustomize, Some(&choice), current_path),
            expected
        );
    }

    #[test]
    fn retag_strips_unrecognized_siblings() {
        let mut source = ApplicationSource {
            helm: Some(HelmDetail::default()),
            kustomize: Some(KustomizeDetail::default()),
            plugin: Some(PluginDetail::default()),
            ..ApplicationSource::default()
        };

        retag(&mut source, RenderingMode::Directory);
        assert_eq!(source.helm, None);
        assert_eq!(source.kustomize, None);
        assert_eq!(source.plugin, None);
        assert_eq!(source.directory, None);
    }

    #[test]
    fn retag_keeps_the_selected_detail() {
        let helm = HelmDetail {
            name: "guestbook".to_owned(),
            ..HelmDetail::default()
        };
        let mut source = ApplicationSource {
            helm: Some(helm.clone()),
            directory: Some(DirectoryDetail::default()),
            ..ApplicationSource::default()
        };

        retag(&mut source, RenderingMode::Helm);
        assert_eq!(source.helm, Some(helm));
        assert_eq!(source.directory, None);
    }

    #[test]
    fn empty_detail_matches_its_mode() {
        for mode in [
            RenderingMode::Directory,
            RenderingMode::Helm,
            RenderingMode::Kustomize,
            RenderingMode::Plugin,
        ] {
            assert_eq!(RenderingDetail::empty(mode).mode(), mode);
        }
    }
}
