pub mod handlers;
pub mod normalize;
pub mod scorer;
pub mod scoring;

pub use scorer::{CandidateScorer, ResumeScorer};
pub use scoring::{ScoreReport, ScoringEngine, ScoringWeights};
