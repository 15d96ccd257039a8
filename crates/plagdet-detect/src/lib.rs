//! Hybrid semantic/lexical plagiarism detection over a candidate set.

pub mod aggregate;
pub mod compare;
mod detector;
pub mod vectors;

pub use aggregate::{confidence, document_similarity};
pub use compare::Comparator;
pub use detector::{Detector, DetectorBuilder};
pub use plagdet_core::types::{CandidateDocument, DetectionResult};
