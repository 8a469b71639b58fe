use std::sync::Arc;

use crate::config::Config;
use crate::discovery::{DiscoveryConfig, DiscoveryOrchestrator, SnippetExtractor};
use crate::errors::AppError;
use crate::matching::normalize::{SkillNormalizer, SkillVocabulary};
use crate::matching::{CandidateScorer, ResumeScorer, ScoringEngine};
use crate::parsing::TextResumeParser;
use crate::providers::{ArtifactFetcher, Embedder, SearchProvider};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Defaults for each discovery run, derived from `config`.
    pub discovery: DiscoveryConfig,
    pub normalizer: Arc<SkillNormalizer>,
    pub vocabulary: Arc<SkillVocabulary>,
    pub engine: Arc<ScoringEngine>,
    /// Pluggable parse-and-score strategy used by resume discovery.
    pub scorer: Arc<dyn CandidateScorer>,
    pub orchestrator: Arc<DiscoveryOrchestrator>,
    pub snippets: Arc<SnippetExtractor>,
}

impl AppState {
    /// Wires the pipeline around the given providers.
    pub fn new(
        config: Config,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn ArtifactFetcher>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, AppError> {
        let normalizer = Arc::new(SkillNormalizer::default());
        let vocabulary = Arc::new(SkillVocabulary::default());

        let engine = Arc::new(ScoringEngine::new(
            config.weights,
            Arc::clone(&normalizer),
            embedder,
        )?);
        let parser = Arc::new(TextResumeParser::new(
            Arc::clone(&vocabulary),
            Arc::clone(&normalizer),
        ));
        let scorer: Arc<dyn CandidateScorer> =
            Arc::new(ResumeScorer::new(parser, Arc::clone(&vocabulary), Arc::clone(&engine)));

        let discovery = config.discovery();
        discovery.validate()?;

        let snippets = Arc::new(SnippetExtractor::new(
            Arc::clone(&search),
            Arc::clone(&vocabulary),
            Arc::clone(&normalizer),
            config.max_profiles,
        ));
        let orchestrator = Arc::new(DiscoveryOrchestrator::new(search, fetcher));

        Ok(Self {
            config,
            discovery,
            normalizer,
            vocabulary,
            engine,
            scorer,
            orchestrator,
            snippets,
        })
    }
}
