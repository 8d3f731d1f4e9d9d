//! The edit session owning the canonical document.
//!
//! All structured field edits funnel through [`EditSession::update`] and are
//! reconciled before they are accepted; the raw-document mode bypasses field
//! reconciliation and merges whole patches instead. Either way the session is
//! the only writer of the canonical document for its whole lifetime.

use serde_json::Value;
use snafu::{ResultExt, Snafu, ensure};
use tracing::debug;

use crate::{
    coalesce::ChangeCoalescer,
    crd::{self, Application},
    destination::{DestFormat, DestinationReconciler, collapse},
    lookup::{DeclaredKind, DetailLookup, DetailQuery, NullLookup, NullRegistry, RepoRegistry},
    merge,
    rendering::{DetectedDetails, PathTypeOverride, RenderingMode, effective_mode, reshape, retag},
    source::{KindChoice, RepoKind, UrlHistory, detect_kind, normalize_source, switch_kind},
    validation,
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to build the session document"))]
    BuildDocument { source: crd::Error },

    #[snafu(display("structured fields cannot be edited while the raw-document editor is open"))]
    DocumentModeActive,

    #[snafu(display("no raw-document editing session is active"))]
    DocumentModeInactive,

    #[snafu(display("failed to apply the document patch"))]
    ApplyPatch { source: merge::Error },

    #[snafu(display("failed to serialize the canonical document for patching"))]
    SerializeBaseline { source: serde_json::Error },

    #[snafu(display("the patched document is not well-formed"))]
    PatchedDocumentInvalid { source: serde_json::Error },

    #[snafu(display("the application failed validation"))]
    Validation { source: validation::Errors },
}

#[derive(Debug)]
enum Mode {
    Structured,
    Document { baseline: Application },
}

/// A single editing session over one application document.
///
/// Dropping the session is teardown: a pending change notification is
/// cancelled and will not fire afterwards.
pub struct EditSession {
    app: Application,
    mode: Mode,
    destination: DestinationReconciler,
    url_history: UrlHistory,
    explicit_kind: Option<KindChoice>,
    path_type_override: Option<PathTypeOverride>,
    details: DetectedDetails,
    coalescer: ChangeCoalescer,
    registry: Box<dyn RepoRegistry>,
    detail_lookup: Box<dyn DetailLookup>,
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("app", &self.app)
            .field("mode", &self.mode)
            .field("details", &self.details)
            .finish_non_exhaustive()
    }
}

impl EditSession {
    /// Opens a session over `partial`, deep-merged over the default skeleton.
    ///
    /// `on_changed` is the external observer, notified per the change
    /// coalescer's contract whenever a mutation is accepted.
    pub fn new(
        partial: &Value,
        on_changed: impl Fn(Application) + Send + Sync + 'static,
    ) -> Result<Self, Error> {
        Self::with_collaborators(
            partial,
            on_changed,
            Box::new(NullRegistry),
            Box::new(NullLookup),
        )
    }

    pub fn with_collaborators(
        partial: &Value,
        on_changed: impl Fn(Application) + Send + Sync + 'static,
        registry: Box<dyn RepoRegistry>,
        detail_lookup: Box<dyn DetailLookup>,
    ) -> Result<Self, Error> {
        let app = Application::from_partial(partial).context(BuildDocumentSnafu)?;
        let mut session = Self {
            app,
            mode: Mode::Structured,
            destination: DestinationReconciler::default(),
            url_history: UrlHistory::default(),
            explicit_kind: None,
            path_type_override: None,
            details: DetectedDetails::default(),
            coalescer: ChangeCoalescer::new(on_changed),
            registry,
            detail_lookup,
        };
        // Bring the supplied document up to the invariants before the first
        // edit; opening a session is not a mutation, so no notification.
        session.render_pass();
        Ok(session)
    }

    /// The canonical document.
    pub fn app(&self) -> &Application {
        &self.app
    }

    /// The destination representation currently displayed.
    pub fn destination_format(&self) -> DestFormat {
        self.destination.format()
    }

    /// Rendering mode and detail payload for the current source location.
    pub fn rendering_details(&self) -> &DetectedDetails {
        &self.details
    }

    /// Applies a structured field edit to the canonical document.
    ///
    /// The edited document is reconciled (source union, destination
    /// representation, rendering detail) before the observer is scheduled.
    pub fn update(&mut self, edit: impl FnOnce(&mut Application)) -> Result<(), Error> {
        self.ensure_structured()?;

        edit(&mut self.app);
        self.render_pass();
        self.coalescer.notify(self.app.clone());
        Ok(())
    }

    /// Re-runs the reconciliation pass without mutating intent.
    ///
    /// Used after better data arrives from a collaborator, and after a
    /// document-mode merge to fold the merged fields back into the
    /// invariants.
    pub fn refresh(&mut self) {
        if matches!(self.mode, Mode::Structured) {
            self.render_pass();
        }
    }

    /// Explicit user switch of the repository kind.
    pub fn set_repo_kind(&mut self, kind: RepoKind) -> Result<(), Error> {
        self.ensure_structured()?;

        if switch_kind(&mut self.app.spec.source, &mut self.url_history, kind) {
            self.explicit_kind = Some(KindChoice {
                kind,
                repo_url: self.app.spec.source.repo_url.clone(),
            });
            self.render_pass();
            self.coalescer.notify(self.app.clone());
        }
        Ok(())
    }

    /// Explicit user switch of the rendering mode.
    ///
    /// Records a path-scoped override and strips detail sub-objects the new
    /// mode does not recognize.
    pub fn set_rendering_mode(&mut self, mode: RenderingMode) -> Result<(), Error> {
        self.ensure_structured()?;

        self.path_type_override = Some(PathTypeOverride {
            path: self.app.spec.source.path.clone(),
            mode,
        });
        retag(&mut self.app.spec.source, mode);
        self.render_pass();
        self.coalescer.notify(self.app.clone());
        Ok(())
    }

    /// Explicit user toggle of the destination representation.
    pub fn toggle_destination(&mut self, format: DestFormat) -> Result<(), Error> {
        self.ensure_structured()?;

        if format == self.destination.format() {
            return Ok(());
        }
        self.destination.toggle(format);
        self.render_pass();
        self.coalescer.notify(self.app.clone());
        Ok(())
    }

    /// Switches to raw-document editing, snapshotting the canonical document
    /// as the patch baseline. Returns the snapshot the editor starts from.
    pub fn enter_document_mode(&mut self) -> Result<&Application, Error> {
        self.ensure_structured()?;

        self.mode = Mode::Document {
            baseline: self.app.clone(),
        };
        Ok(&self.app)
    }

    /// Merges a textual patch over the baseline and installs the result as
    /// the canonical document, returning to structured mode.
    ///
    /// Object keys deep-merge, `null` leaves delete, arrays and scalars
    /// replace wholesale. A malformed patch is rejected before the merge and
    /// leaves both the document and the mode untouched.
    pub fn apply_patch(&mut self, patch_text: &str) -> Result<(), Error> {
        let Mode::Document { baseline } = &self.mode else {
            return DocumentModeInactiveSnafu.fail();
        };

        let patch = merge::parse_patch(patch_text).context(ApplyPatchSnafu)?;
        let mut doc = serde_json::to_value(baseline).context(SerializeBaselineSnafu)?;
        merge::apply_merge_patch(&mut doc, &patch);
        let merged: Application =
            serde_json::from_value(doc).context(PatchedDocumentInvalidSnafu)?;

        debug!("installing merged document from raw patch");
        self.app = merged;
        self.mode = Mode::Structured;
        // A whole-document replacement must reach the observer immediately,
        // a debounced stale snapshot would race the editor view.
        self.coalescer.notify_now(self.app.clone());
        Ok(())
    }

    /// Leaves raw-document editing without touching the canonical document.
    pub fn cancel_document_mode(&mut self) -> Result<(), Error> {
        ensure!(
            matches!(self.mode, Mode::Document { .. }),
            DocumentModeInactiveSnafu
        );
        self.mode = Mode::Structured;
        Ok(())
    }

    /// Validates and finishes the document for the external create operation.
    ///
    /// The returned document carries exactly one destination identifier and a
    /// source collapsed to a single representation.
    pub fn submit(&mut self) -> Result<Application, Error> {
        self.ensure_structured()?;

        self.render_pass();
        validate(&self.app)?;

        let mut finished = self.app.clone();
        collapse(&mut finished.spec.destination, self.destination.format());
        Ok(finished)
    }

    fn ensure_structured(&self) -> Result<(), Error> {
        ensure!(matches!(self.mode, Mode::Structured), DocumentModeActiveSnafu);
        Ok(())
    }

    fn render_pass(&mut self) {
        self.reconcile_source();
        self.destination.reconcile(&mut self.app.spec.destination);
        self.reconcile_rendering();
    }

    /// Collapses the source union to the currently authoritative kind:
    /// registry metadata first, then a still-valid explicit user choice, then
    /// client-side scheme detection.
    fn reconcile_source(&mut self) {
        if self
            .explicit_kind
            .as_ref()
            .is_some_and(|choice| !choice.applies_to(&self.app.spec.source.repo_url))
        {
            self.explicit_kind = None;
        }

        let source = &mut self.app.spec.source;
        let target = match self.registry.declared_kind(&source.repo_url) {
            Some(DeclaredKind::Declared(kind)) => kind,
            Some(DeclaredKind::Unknown) => match &self.explicit_kind {
                Some(choice) => choice.kind,
                None => RepoKind::Git,
            },
            // Not registered, scheme detection is authoritative. Normalizing
            // towards the detected kind is how double population left behind
            // by a raw merge gets repaired.
            None => detect_kind(source),
        };
        normalize_source(source, target);
    }

    fn reconcile_rendering(&mut self) {
        let source = &self.app.spec.source;
        let path = source.path.as_deref().unwrap_or_default();
        let chart = source.chart.as_deref().unwrap_or_default();
        let locatable =
            !source.repo_url.is_empty() && !source.target_revision.is_empty()
                && (!path.is_empty() || !chart.is_empty());

        let detected = if locatable {
            let query = DetailQuery {
                repo_url: &source.repo_url,
                path: source.path.as_deref(),
                chart: source.chart.as_deref(),
                target_revision: &source.target_revision,
                app_name: &self.app.metadata.name,
                project: &self.app.spec.project,
            };
            self.detail_lookup.app_details(&query).unwrap_or_else(|error| {
                debug!(%error, "detail lookup failed, treating as plain directory");
                DetectedDetails::default()
            })
        } else {
            DetectedDetails::default()
        };

        let mode = effective_mode(
            detected.mode,
            self.path_type_override.as_ref(),
            self.app.spec.source.path.as_deref(),
        );
        self.details = reshape(detected, mode);
    }
}

fn validate(app: &Application) -> Result<(), Error> {
    validation::validate(app).context(ValidationSnafu)
}
