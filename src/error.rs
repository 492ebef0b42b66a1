use thiserror::Error;

/// Errors that abort a triage run.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("htslib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, TriageError>;

/// A structurally invalid variant line. These are skipped and counted, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected at least 8 columns, found {found}")]
    TooFewColumns { found: usize },

    #[error("invalid position: '{0}'")]
    InvalidPosition(String),

    #[error("invalid quality: '{0}'")]
    InvalidQuality(String),
}
