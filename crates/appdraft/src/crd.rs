//! The application document as it crosses the wire.
//!
//! These types are deliberately loose: both identifying fields of a union may
//! be present or absent at the same time here. The modules operating on the
//! document ([`crate::source`], [`crate::destination`], [`crate::rendering`])
//! hold the tagged counterparts and are responsible for collapsing the unions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

use crate::{
    merge::deep_merge,
    rendering::{DirectoryDetail, HelmDetail, KustomizeDetail, PluginDetail},
};

pub const API_VERSION: &str = "argoproj.io/v1alpha1";
pub const KIND: &str = "Application";

/// Symbolic revision tracking the latest state of a git or OCI repository.
pub const DEFAULT_REVISION: &str = "HEAD";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to serialize the default application skeleton"))]
    SerializeSkeleton { source: serde_json::Error },

    #[snafu(display("the merged application document is not well-formed"))]
    DeserializeDocument { source: serde_json::Error },
}

/// A deployable application document.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub spec: ApplicationSpec,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// The application name. Must be non-empty by submission time.
    #[serde(default)]
    pub name: String,

    /// Finalizers are carried through untouched, the engine never inspects them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    /// The project this application belongs to. Must be non-empty by submission time.
    #[serde(default)]
    pub project: String,

    #[serde(default)]
    pub source: ApplicationSource,

    #[serde(default)]
    pub destination: ApplicationDestination,

    /// Opaque pass-through. Automated sync, sync options and retry settings
    /// round-trip unchanged, nothing in this crate normalizes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_policy: Option<serde_json::Value>,
}

/// Where application content comes from.
///
/// Identified either by `path` (git and OCI repositories) or by `chart`
/// (packaged charts). Both fields may transiently coexist while a raw patch is
/// being merged; [`crate::source::normalize_source`] restores exclusivity.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSource {
    #[serde(rename = "repoURL", default)]
    pub repo_url: String,

    /// Subpath within a git or OCI repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Chart name within a chart repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,

    /// Revision for git/OCI sources, version for chart sources.
    #[serde(default)]
    pub target_revision: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<HelmDetail>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kustomize: Option<KustomizeDetail>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<DirectoryDetail>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<PluginDetail>,
}

/// Where the application is deployed to.
///
/// Identified either by cluster `name` or by cluster `server` address. Which
/// one is authoritative is tracked outside the document, see
/// [`crate::destination::DestinationReconciler`].
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDestination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    #[serde(default)]
    pub namespace: String,
}

fn default_api_version() -> String {
    API_VERSION.to_owned()
}

fn default_kind() -> String {
    KIND.to_owned()
}

impl Default for Application {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: Metadata::default(),
            spec: ApplicationSpec::default(),
        }
    }
}

impl Default for ApplicationSource {
    fn default() -> Self {
        Self {
            repo_url: String::new(),
            path: Some(String::new()),
            chart: None,
            target_revision: DEFAULT_REVISION.to_owned(),
            helm: None,
            kustomize: None,
            directory: None,
            plugin: None,
        }
    }
}

impl Application {
    /// Builds a document from a caller-supplied partial value, deep-merged
    /// over the default skeleton.
    ///
    /// The merge is non-destructive: supplied objects merge key-wise, supplied
    /// scalars and arrays replace the skeleton value, unspecified sibling keys
    /// survive untouched.
    pub fn from_partial(partial: &serde_json::Value) -> Result<Self, Error> {
        let mut doc = serde_json::to_value(Self::default()).context(SerializeSkeletonSnafu)?;
        deep_merge(&mut doc, partial);
        serde_json::from_value(doc).context(DeserializeDocumentSnafu)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use serde_json::json;

    use super::*;

    #[test]
    fn skeleton_has_expected_defaults() {
        let app = Application::default();

        assert_eq!(app.api_version, API_VERSION);
        assert_eq!(app.kind, KIND);
        assert_eq!(app.metadata.name, "");
        assert_eq!(app.spec.project, "");
        assert_eq!(app.spec.source.path.as_deref(), Some(""));
        assert_eq!(app.spec.source.chart, None);
        assert_eq!(app.spec.source.target_revision, DEFAULT_REVISION);
        assert_eq!(app.spec.destination.name, None);
        assert_eq!(app.spec.destination.server, None);
        assert_eq!(app.spec.destination.namespace, "");
    }

    #[test]
    fn from_partial_keeps_unspecified_siblings() {
        let app = Application::from_partial(&json!({
            "spec": {
                "project": "default",
            },
        }))
        .expect("partial document is well-formed");

        assert_eq!(app.spec.project, "default");
        // The skeleton source must not have been truncated by the merge.
        assert_eq!(app.spec.source.target_revision, DEFAULT_REVISION);
        assert_eq!(app.spec.source.path.as_deref(), Some(""));
    }

    #[test]
    fn from_partial_replaces_scalars_and_arrays() {
        let app = Application::from_partial(&json!({
            "metadata": {
                "name": "guestbook",
                "finalizers": ["resources-finalizer.argocd.argoproj.io"],
            },
            "spec": {
                "source": {
                    "repoURL": "https://github.com/argoproj/argocd-example-apps",
                    "targetRevision": "v1.2.3",
                },
            },
        }))
        .expect("partial document is well-formed");

        assert_eq!(app.metadata.name, "guestbook");
        assert_eq!(
            app.metadata.finalizers,
            vec!["resources-finalizer.argocd.argoproj.io"]
        );
        assert_eq!(app.spec.source.target_revision, "v1.2.3");
    }

    #[test]
    fn sync_policy_round_trips_untouched() {
        let sync_policy = json!({
            "automated": {"prune": true, "selfHeal": false, "enabled": true},
            "syncOptions": ["CreateNamespace=true"],
            "retry": {"limit": 5},
        });
        let app = Application::from_partial(&json!({"spec": {"syncPolicy": sync_policy}}))
            .expect("partial document is well-formed");

        assert_eq!(app.spec.sync_policy, Some(sync_policy));
    }

    #[test]
    fn document_deserializes_from_yaml() {
        let app: Application = serde_yaml::from_str(indoc! {"
            apiVersion: argoproj.io/v1alpha1
            kind: Application
            metadata:
              name: guestbook
            spec:
              project: default
              source:
                repoURL: https://github.com/argoproj/argocd-example-apps
                path: guestbook
                targetRevision: HEAD
              destination:
                server: https://kubernetes.default.svc
                namespace: guestbook
        "})
        .expect("document YAML is valid");

        assert_eq!(app.metadata.name, "guestbook");
        assert_eq!(app.spec.source.path.as_deref(), Some("guestbook"));
        assert_eq!(
            app.spec.destination.server.as_deref(),
            Some("https://kubernetes.default.svc")
        );
    }

    #[test]
    fn absent_union_fields_are_not_serialized() {
        let doc = serde_json::to_value(Application::default()).expect("skeleton serializes");

        assert!(doc["spec"]["destination"].get("name").is_none());
        assert!(doc["spec"]["destination"].get("server").is_none());
        assert!(doc["spec"]["source"].get("chart").is_none());
        assert!(doc["metadata"].get("finalizers").is_none());
    }
}
