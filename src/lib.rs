pub mod allowlist;
pub mod annotation;
pub mod error;
pub mod filter;
pub mod genotypes;
pub mod igv;
pub mod io;
pub mod summary;
pub mod triage;
pub mod variant;

pub use allowlist::GeneAllowlist;
pub use annotation::{Annotation, AnnotationLayout, Annotator};
pub use error::{ParseError, Result, TriageError};
pub use filter::{FilterConfig, FilterEngine, FilterOutcome, FilterReason, SiteMetrics};
pub use summary::{Summary, SummaryStats};
pub use triage::{Triage, TriageRow};
pub use variant::VariantRecord;
