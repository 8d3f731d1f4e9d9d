//! Decides which destination representation is displayed and authoritative.
//!
//! The destination is identified either by cluster name or by cluster URL.
//! Which field the user is editing is a UI-side choice that must survive
//! documents arriving from outside (raw patches, caller-supplied drafts)
//! without clobbering fields those documents already carry.

use tracing::debug;

use crate::crd::ApplicationDestination;

/// The representation the user currently edits.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display)]
pub enum DestFormat {
    /// Identify the cluster by its registered name.
    Name,

    /// Identify the cluster by its API server address.
    #[default]
    Url,
}

/// Two-state machine over [`DestFormat`], driven by explicit toggles and
/// passive inference from the document.
///
/// Kept as explicit state instead of ad hoc booleans so the transition rules
/// stay auditable: `explicitly_toggled` records that a toggle ever happened,
/// `from_menu` marks the one render pass that directly follows a local menu
/// action and is consumed by it.
#[derive(Debug, Default)]
pub struct DestinationReconciler {
    format: DestFormat,
    explicitly_toggled: bool,
    from_menu: bool,
}

impl DestinationReconciler {
    /// Records an explicit user toggle to `format`.
    pub fn toggle(&mut self, format: DestFormat) {
        self.format = format;
        self.explicitly_toggled = true;
        self.from_menu = true;
    }

    /// The representation chosen by the most recent [`Self::reconcile`] pass.
    pub fn format(&self) -> DestFormat {
        self.format
    }

    /// Runs one reconciliation pass over the destination, returning the
    /// representation to display.
    ///
    /// Without a prior explicit toggle the state is inferred from which field
    /// is populated; a document with neither field gets an addressable empty
    /// `server` placeholder. With an explicit toggle the non-selected field is
    /// deleted, unless the toggle is stale (not from the immediately preceding
    /// menu action) and the document already carries the other field, in which
    /// case the document wins.
    pub fn reconcile(&mut self, destination: &mut ApplicationDestination) -> DestFormat {
        let from_menu = std::mem::take(&mut self.from_menu);

        if !self.explicitly_toggled {
            self.format = match (&destination.name, &destination.server) {
                (Some(_), _) => DestFormat::Name,
                (None, Some(_)) => DestFormat::Url,
                (None, None) => {
                    destination.server = Some(String::new());
                    DestFormat::Url
                }
            };
            return self.format;
        }

        match self.format {
            DestFormat::Name => {
                if destination.name.is_none() && destination.server.is_some() && !from_menu {
                    // An externally supplied document beat a stale toggle
                    // intent. Keep its populated field.
                    debug!("deferring name toggle to the populated server field");
                    self.format = DestFormat::Url;
                } else {
                    destination.server = None;
                    if destination.name.is_none() {
                        destination.name = Some(String::new());
                    }
                }
            }
            DestFormat::Url => {
                if destination.server.is_none() && destination.name.is_some() && !from_menu {
                    debug!("deferring server toggle to the populated name field");
                    self.format = DestFormat::Name;
                } else {
                    destination.name = None;
                    if destination.server.is_none() {
                        destination.server = Some(String::new());
                    }
                }
            }
        }
        self.format
    }
}

/// Collapses the destination to a single identifying field for submission.
///
/// Transient placeholder values in the non-selected field are discarded
/// regardless of content.
pub fn collapse(destination: &mut ApplicationDestination, format: DestFormat) {
    match format {
        DestFormat::Name => destination.server = None,
        DestFormat::Url => destination.name = None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination(name: Option<&str>, server: Option<&str>) -> ApplicationDestination {
        ApplicationDestination {
            name: name.map(str::to_owned),
            server: server.map(str::to_owned),
            namespace: String::new(),
        }
    }

    #[test]
    fn infers_name_from_populated_field() {
        let mut reconciler = DestinationReconciler::default();
        let mut dest = destination(Some("prod"), None);

        assert_eq!(reconciler.reconcile(&mut dest), DestFormat::Name);
        assert_eq!(dest.name.as_deref(), Some("prod"));
    }

    #[test]
    fn infers_url_from_populated_field() {
        let mut reconciler = DestinationReconciler::default();
        let mut dest = destination(None, Some("https://kubernetes.default.svc"));

        assert_eq!(reconciler.reconcile(&mut dest), DestFormat::Url);
    }

    #[test]
    fn empty_destination_defaults_to_url_with_placeholder() {
        let mut reconciler = DestinationReconciler::default();
        let mut dest = destination(None, None);

        assert_eq!(reconciler.reconcile(&mut dest), DestFormat::Url);
        assert_eq!(dest.server.as_deref(), Some(""));
        assert_eq!(dest.name, None);
    }

    #[test]
    fn menu_toggle_deletes_the_other_field() {
        let mut reconciler = DestinationReconciler::default();
        let mut dest = destination(Some("prod"), None);
        reconciler.reconcile(&mut dest);

        reconciler.toggle(DestFormat::Url);
        assert_eq!(reconciler.reconcile(&mut dest), DestFormat::Url);
        assert_eq!(dest.name, None);
        assert_eq!(dest.server.as_deref(), Some(""));
    }

    #[test]
    fn stale_toggle_defers_to_external_document() {
        let mut reconciler = DestinationReconciler::default();
        let mut dest = destination(None, None);
        reconciler.toggle(DestFormat::Name);
        reconciler.reconcile(&mut dest);

        // A document arrives from outside carrying only a server address.
        let mut external = destination(None, Some("https://kubernetes.default.svc"));
        assert_eq!(reconciler.reconcile(&mut external), DestFormat::Url);
        assert_eq!(
            external.server.as_deref(),
            Some("https://kubernetes.default.svc")
        );
    }

    #[test]
    fn honored_toggle_stays_stable_across_passes() {
        let mut reconciler = DestinationReconciler::default();
        let mut dest = destination(None, Some("https://kubernetes.default.svc"));
        reconciler.toggle(DestFormat::Name);

        assert_eq!(reconciler.reconcile(&mut dest), DestFormat::Name);
        assert_eq!(dest.server, None);
        assert_eq!(dest.name.as_deref(), Some(""));

        // The next pass sees the placeholder and keeps the choice.
        assert_eq!(reconciler.reconcile(&mut dest), DestFormat::Name);
        assert_eq!(dest.name.as_deref(), Some(""));
    }

    #[test]
    fn collapse_removes_the_non_selected_field() {
        let mut dest = destination(Some(""), Some("https://kubernetes.default.svc"));
        collapse(&mut dest, DestFormat::Url);
        assert_eq!(dest.name, None);

        let mut dest = destination(Some("prod"), Some(""));
        collapse(&mut dest, DestFormat::Name);
        assert_eq!(dest.server, None);
    }
}
