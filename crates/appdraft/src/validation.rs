//! Submission validation.
//!
//! Validation errors are user-facing and field-scoped. They block submission
//! but are never fatal to the edit session, and they are re-evaluated from
//! scratch on every call rather than accumulated.

use std::fmt::Display;

use snafu::Snafu;

use crate::crd::Application;

type Result<T = (), E = Errors> = std::result::Result<T, E>;

/// A collection of errors discovered during validation.
#[derive(Debug)]
pub struct Errors(Vec<Error>);

impl Errors {
    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.0.iter()
    }

    pub fn contains(&self, error: &Error) -> bool {
        self.0.contains(error)
    }
}

impl Display for Errors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            let prefix = match i {
                0 => "",
                _ => ", ",
            };
            write!(f, "{prefix}{error}")?;
        }
        Ok(())
    }
}
impl std::error::Error for Errors {}

/// A single validation error, scoped to the field returned by
/// [`Error::field`].
#[derive(Debug, Eq, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("Application Name is required"))]
    NameRequired,

    #[snafu(display("Project Name is required"))]
    ProjectRequired,

    #[snafu(display("Repository URL is required"))]
    RepoUrlRequired,

    #[snafu(display("Version is required"))]
    VersionRequired,

    #[snafu(display("Path is required"))]
    PathRequired,

    #[snafu(display("Chart is required"))]
    ChartRequired,

    #[snafu(display("Cluster URL is required"))]
    ClusterUrlRequired,

    #[snafu(display("Cluster name is required"))]
    ClusterNameRequired,
}

impl Error {
    /// Dotted path of the document field the error is scoped to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NameRequired => "metadata.name",
            Self::ProjectRequired => "spec.project",
            Self::RepoUrlRequired => "spec.source.repoURL",
            Self::VersionRequired => "spec.source.targetRevision",
            Self::PathRequired => "spec.source.path",
            Self::ChartRequired => "spec.source.chart",
            Self::ClusterUrlRequired => "spec.destination.server",
            Self::ClusterNameRequired => "spec.destination.name",
        }
    }
}

/// Validates a document for submission.
pub fn validate(app: &Application) -> Result {
    let mut errors = Vec::new();

    if app.metadata.name.is_empty() {
        errors.push(Error::NameRequired);
    }
    if app.spec.project.is_empty() {
        errors.push(Error::ProjectRequired);
    }

    let source = &app.spec.source;
    if source.repo_url.is_empty() {
        errors.push(Error::RepoUrlRequired);
    }
    if source.chart.is_some() && source.target_revision.is_empty() {
        errors.push(Error::VersionRequired);
    }
    let path_empty = source.path.as_deref().unwrap_or_default().is_empty();
    let chart_empty = source.chart.as_deref().unwrap_or_default().is_empty();
    if path_empty && chart_empty {
        errors.push(Error::PathRequired);
        errors.push(Error::ChartRequired);
    }

    let destination = &app.spec.destination;
    let name_missing = destination.name.as_deref().unwrap_or_default().is_empty();
    let server_missing = destination.server.as_deref().unwrap_or_default().is_empty();
    if server_missing && name_missing {
        // Neither representation resolves the cluster, flag both fields so the
        // one currently displayed carries an error either way.
        errors.push(Error::ClusterUrlRequired);
        errors.push(Error::ClusterNameRequired);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Errors(errors))
    }
}
