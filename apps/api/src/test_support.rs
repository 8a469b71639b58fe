//! Fakes and fixtures shared by the in-module tests.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::models::{StructuredCandidate, StructuredJD};
use crate::providers::{
    Artifact, ArtifactFetcher, Embedder, FetchError, ProviderError, SearchHit, SearchProvider,
};

pub fn skills(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Senior data JD with the given skills and nothing else.
pub fn jd_with_skills(items: &[&str]) -> StructuredJD {
    StructuredJD {
        skills: skills(items),
        seniority_level: "senior".to_string(),
        domain: "data".to_string(),
        ..Default::default()
    }
}

pub fn candidate(name: &str, text: &str, items: &[&str]) -> StructuredCandidate {
    StructuredCandidate {
        name: name.to_string(),
        raw_text: text.to_string(),
        skills: skills(items),
        source_url: None,
        path: None,
    }
}

pub fn hit(url: &str) -> SearchHit {
    SearchHit {
        title: String::new(),
        snippet: String::new(),
        url: url.to_string(),
    }
}

pub fn profile_hit(title: &str, snippet: &str, url: &str) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        snippet: snippet.to_string(),
        url: url.to_string(),
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        Err(ProviderError::Exhausted { retries: 3 })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Replays scripted responses in order, then returns empty result pages.
pub struct FakeSearch {
    responses: Mutex<VecDeque<Result<Vec<SearchHit>, ()>>>,
    queries: Mutex<Vec<String>>,
    always_fail: bool,
}

impl FakeSearch {
    pub fn new(responses: Vec<Result<Vec<SearchHit>, ()>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            queries: Mutex::new(Vec::new()),
            always_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.always_fail {
            return Err(ProviderError::Api {
                status: 503,
                message: "search down".to_string(),
            });
        }
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(hits)) => Ok(hits),
            Some(Err(())) => Err(ProviderError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

/// Serves bodies from a URL map; unknown URLs are 404s.
#[derive(Default)]
pub struct FakeFetcher {
    bodies: HashMap<String, String>,
    delay: Option<Duration>,
    url_delays: HashMap<String, Duration>,
    attempts: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn new<'a>(bodies: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            bodies: bodies
                .into_iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Overrides the delay for one URL, to control completion order.
    pub fn with_url_delay(mut self, url: &str, delay: Duration) -> Self {
        self.url_delays.insert(url.to_string(), delay);
        self
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Artifact, FetchError> {
        self.attempts.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.url_delays.get(url).copied().or(self.delay) {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.bodies.get(url) {
            Some(body) => Ok(Artifact::from_bytes(
                url,
                Some("text/plain".to_string()),
                Bytes::from(body.clone()),
            )),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
