use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all Graft operations.
#[derive(Debug, Error, Diagnostic)]
pub enum GraftError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed project manifest (`Graft.toml`).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your Graft.toml for syntax errors"))]
    Manifest { message: String },

    /// Invalid global configuration (`~/.graft/config.toml`).
    #[error("Config error: {message}")]
    Config { message: String },

    /// The module registry file could not be read or parsed.
    #[error("Registry error: {message}")]
    #[diagnostic(help("Check the [registry] path in Graft.toml"))]
    Registry { message: String },

    /// Lockfile missing, unreadable, or out of date.
    #[error("Lockfile error: {message}")]
    #[diagnostic(help("Run `graft lock` to regenerate Graft.lock"))]
    Lockfile { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type GraftResult<T> = miette::Result<T>;
