pub mod candidate;
pub mod jd;

pub use candidate::StructuredCandidate;
pub use jd::StructuredJD;
