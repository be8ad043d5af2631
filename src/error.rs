use std::path::PathBuf;

/// Errors that can occur while analysing a solution or resolving a build.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("IO error: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML error: {}: {source}", .path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("unsupported type for path: {}", .0.display())]
    UnsupportedInput(PathBuf),

    #[error("Invalid id found in project: {} (expected {expected}, found {found})", .path.display())]
    ProjectIdMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("No configuration mapping found for ({configuration}) in project {project}")]
    MissingMapping { configuration: String, project: String },

    #[error("Configuration ({configuration}) is not defined in project {project}")]
    MissingProjectConfiguration { configuration: String, project: String },

    #[error("No default Xcode archive path found at {}", .0.display())]
    MissingArchiveRoot(PathBuf),

    #[error("No Xcode archive path configured and HOME is not set")]
    ArchiveRootUnset,
}

pub type Result<T> = std::result::Result<T, PlanError>;
