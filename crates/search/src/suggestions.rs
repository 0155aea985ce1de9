//! Debounced place suggestions
//!
//! [`PlaceSuggestionFetcher`] turns a live text query into a list of place
//! suggestions. Network calls wait for the query to stay unchanged for the
//! debounce period and are skipped entirely below the minimum length. Every
//! fetch takes a ticket; a response is only applied if its ticket is still
//! current when it arrives.

use crate::categories::CategoryCatalog;
use crate::error::SearchError;
use crate::relevance::calculate_relevance;
use fourmore_api_client::{PlacesBackend, Poi, SearchBias};
use fourmore_core::config::ConfigSchema;
use fourmore_core::debounce::Debouncer;
use fourmore_core::sequence::RequestSequence;
use fourmore_geo::Coordinate;
use fourmore_telemetry::{metrics, names};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, trace, warn};
use unicode_segmentation::UnicodeSegmentation;

/// Observable output of the fetcher
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionState {
    /// Raw query as typed
    pub query: String,
    pub suggestions: Vec<Poi>,
    pub is_fetching: bool,
    /// User-facing message for the last failed fetch
    pub error: Option<String>,
    pub has_minimum_query: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestionConfig {
    /// Minimum query length in grapheme clusters
    pub min_query_length: usize,
    pub debounce: Duration,
    pub limit: usize,
    /// Radius sent along with a location bias
    pub bias_radius_m: u32,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self::from_schema(&ConfigSchema::default())
    }
}

impl SuggestionConfig {
    pub fn from_schema(schema: &ConfigSchema) -> Self {
        Self {
            min_query_length: schema.search.min_query_length,
            debounce: Duration::from_millis(schema.search.suggestion_debounce_ms),
            limit: schema.search.suggestion_limit,
            bias_radius_m: schema.search.suggestion_radius_m,
        }
    }

    /// True if `query` is long enough to hit the network
    pub fn meets_minimum(&self, query: &str) -> bool {
        query.trim().graphemes(true).count() >= self.min_query_length
    }
}

#[derive(Debug)]
struct Params {
    query: String,
    enabled: bool,
    bias: Option<SearchBias>,
    /// Last applied backend answer, before local filtering
    fetched: Vec<Poi>,
}

#[derive(Debug)]
struct Shared<B> {
    backend: B,
    config: SuggestionConfig,
    catalog: Arc<CategoryCatalog>,
    sequence: RequestSequence,
    params: Mutex<Params>,
    state: watch::Sender<SuggestionState>,
}

impl<B> Shared<B> {
    fn params(&self) -> std::sync::MutexGuard<'_, Params> {
        self.params.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Keep fetched places whose name or category contains the query
    fn filter(&self, fetched: &[Poi], query: &str) -> Vec<Poi> {
        fetched
            .iter()
            .filter(|poi| {
                poi.name
                    .as_deref()
                    .is_some_and(|name| calculate_relevance(name, query).is_substring_match())
                    || self.catalog.matches(&poi.class, query)
            })
            .cloned()
            .collect()
    }
}

/// Debounced, race-safe free-text place search
#[derive(Debug)]
pub struct PlaceSuggestionFetcher<B> {
    shared: Arc<Shared<B>>,
    debouncer: Debouncer,
}

impl<B: PlacesBackend + 'static> PlaceSuggestionFetcher<B> {
    pub fn new(backend: B, config: SuggestionConfig) -> Self {
        Self::with_catalog(backend, config, Arc::new(CategoryCatalog::builtin().clone()))
    }

    /// Use `catalog` to match category labels locally
    pub fn with_catalog(backend: B, config: SuggestionConfig, catalog: Arc<CategoryCatalog>) -> Self {
        let (state, _) = watch::channel(SuggestionState::default());
        Self {
            shared: Arc::new(Shared {
                backend,
                config,
                catalog,
                sequence: RequestSequence::new(),
                params: Mutex::new(Params {
                    query: String::new(),
                    enabled: true,
                    bias: None,
                    fetched: Vec::new(),
                }),
                state,
            }),
            debouncer: Debouncer::new(config.debounce),
        }
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.shared.config
    }

    /// Current output
    pub fn state(&self) -> SuggestionState {
        self.shared.state.borrow().clone()
    }

    /// Change notifications for the output
    pub fn subscribe(&self) -> watch::Receiver<SuggestionState> {
        self.shared.state.subscribe()
    }

    /// Update the live query
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_query(&self, query: &str) {
        let changed = {
            let mut params = self.shared.params();
            let changed = params.query != query;
            params.query = query.to_string();
            changed
        };
        if changed {
            self.refresh();
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        let changed = {
            let mut params = self.shared.params();
            let changed = params.enabled != enabled;
            params.enabled = enabled;
            changed
        };
        if changed {
            self.refresh();
        }
    }

    /// Bias results toward `center`; `None` searches everywhere
    pub fn set_bias(&self, center: Option<Coordinate>) {
        let bias = center.map(|center| SearchBias {
            center,
            radius_m: self.shared.config.bias_radius_m,
        });
        let changed = {
            let mut params = self.shared.params();
            let changed = params.bias != bias;
            params.bias = bias;
            changed
        };
        if changed {
            self.refresh();
        }
    }

    /// Cancel the pending timer and discard whatever is in flight
    pub fn shutdown(&self) {
        self.debouncer.cancel();
        self.shared.sequence.invalidate();
        self.shared.state.send_modify(|state| state.is_fetching = false);
    }

    fn refresh(&self) {
        let shared = &self.shared;
        let params = shared.params();
        let has_minimum = shared.config.meets_minimum(&params.query);

        // Anything issued under the old parameters is now stale
        shared.sequence.invalidate();

        if !params.enabled || !has_minimum {
            self.debouncer.cancel();
            let query = params.query.clone();
            drop(params);
            trace!(%query, "Query below minimum or disabled, clearing suggestions");
            shared.state.send_modify(|state| {
                *state = SuggestionState {
                    query,
                    has_minimum_query: has_minimum,
                    ..SuggestionState::default()
                };
            });
            return;
        }

        let query = params.query.clone();
        let bias = params.bias;
        let local = shared.filter(&params.fetched, &query);
        drop(params);

        shared.state.send_modify(|state| {
            state.query = query.clone();
            state.suggestions = local;
            state.is_fetching = false;
            state.has_minimum_query = true;
        });

        let task = Arc::clone(shared);
        self.debouncer.schedule(async move { fetch(task, query, bias).await });
    }
}

impl<B> Drop for PlaceSuggestionFetcher<B> {
    fn drop(&mut self) {
        self.shared.sequence.invalidate();
    }
}

async fn fetch<B: PlacesBackend>(shared: Arc<Shared<B>>, query: String, bias: Option<SearchBias>) {
    let ticket = {
        let params = shared.params();
        // A refresh that ran after this fetch was scheduled has already
        // invalidated it, possibly before any ticket existed
        if !params.enabled || params.query != query || params.bias != bias {
            trace!(%query, "Parameters changed before the fetch started");
            return;
        }
        let ticket = shared.sequence.issue();
        shared.state.send_modify(|state| {
            state.is_fetching = true;
            state.error = None;
        });
        ticket
    };
    metrics().increment(names::SUGGESTION_FETCHES);
    debug!(%query, generation = ticket.generation(), "Fetching place suggestions");

    let result = shared
        .backend
        .search_places(query.trim(), shared.config.limit, bias)
        .await;

    let mut params = shared.params();
    if !shared.sequence.is_current(ticket) {
        metrics().increment(names::STALE_RESPONSES_DISCARDED);
        debug!(%query, generation = ticket.generation(), "Discarding stale suggestions");
        return;
    }

    match result {
        Ok(places) => {
            let filtered = shared.filter(&places, &params.query);
            params.fetched = places;
            drop(params);
            debug!(%query, count = filtered.len(), "Place suggestions updated");
            shared.state.send_modify(|state| {
                state.suggestions = filtered;
                state.is_fetching = false;
            });
        }
        Err(e) => {
            drop(params);
            warn!(%query, error = %e, "Place suggestion fetch failed");
            let message = SearchError::from(e).user_message();
            shared.state.send_modify(|state| {
                state.error = Some(message);
                state.is_fetching = false;
            });
        }
    }
}
