//! In-memory [`PlacesBackend`] for tests
//!
//! Records every call and answers from a scripted responder, optionally after
//! a delay so out-of-order completion can be staged under paused tokio time.

use async_trait::async_trait;
use fourmore_api_client::{ApiError, ApiResult, OsmType, PlacesBackend, Poi, SearchBias};
use fourmore_geo::BoundingBox;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Search {
        query: String,
        limit: usize,
        bias: Option<SearchBias>,
    },
    Bbox {
        bbox: BoundingBox,
        category: Option<String>,
        limit: usize,
    },
}

impl BackendCall {
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Search { query, .. } => Some(query),
            Self::Bbox { .. } => None,
        }
    }

    pub fn bbox(&self) -> Option<&BoundingBox> {
        match self {
            Self::Bbox { bbox, .. } => Some(bbox),
            Self::Search { .. } => None,
        }
    }
}

/// A scripted answer
#[derive(Debug)]
pub struct Scripted {
    delay: Duration,
    result: ApiResult<Vec<Poi>>,
}

impl Scripted {
    pub fn ok(pois: Vec<Poi>) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(pois),
        }
    }

    pub fn empty() -> Self {
        Self::ok(Vec::new())
    }

    pub fn err(error: ApiError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    /// Resolve only after `delay`
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Responder = dyn Fn(&BackendCall, usize) -> Scripted + Send + Sync;

/// Recording fake; the responder sees each call and its zero-based index
pub struct FakeBackend {
    calls: Mutex<Vec<BackendCall>>,
    responder: Box<Responder>,
}

impl fmt::Debug for FakeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeBackend")
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::with_responder(|_, _| Scripted::empty())
    }
}

impl FakeBackend {
    /// Answers every call with no results
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every call with a copy of `pois`
    pub fn returning(pois: Vec<Poi>) -> Self {
        Self::with_responder(move |_, _| Scripted::ok(pois.clone()))
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&BackendCall, usize) -> Scripted + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Free-text queries in call order
    pub fn queries(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|call| call.query().map(str::to_string))
            .collect()
    }

    /// Bounding boxes in call order
    pub fn boxes(&self) -> Vec<BoundingBox> {
        self.calls().iter().filter_map(|call| call.bbox().copied()).collect()
    }

    async fn answer(&self, call: BackendCall) -> ApiResult<Vec<Poi>> {
        let scripted = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            let index = calls.len();
            let scripted = (self.responder)(&call, index);
            calls.push(call);
            scripted
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.result
    }
}

#[async_trait]
impl PlacesBackend for FakeBackend {
    async fn search_places(&self, query: &str, limit: usize, bias: Option<SearchBias>) -> ApiResult<Vec<Poi>> {
        self.answer(BackendCall::Search {
            query: query.to_string(),
            limit,
            bias,
        })
        .await
    }

    async fn search_places_in_bbox(
        &self,
        bbox: &BoundingBox,
        category: Option<&str>,
        limit: usize,
    ) -> ApiResult<Vec<Poi>> {
        self.answer(BackendCall::Bbox {
            bbox: *bbox,
            category: category.map(str::to_string),
            limit,
        })
        .await
    }
}

/// A node POI with just the fields search and map code look at
pub fn poi(osm_id: i64, name: &str, class: &str, lat: f64, lon: f64) -> Poi {
    Poi {
        osm_type: OsmType::Node,
        osm_id,
        name: (!name.is_empty()).then(|| name.to_string()),
        class: class.to_string(),
        lat,
        lon,
        address: None,
        phone: None,
        website: None,
        opening_hours: None,
        tags: BTreeMap::new(),
        version: None,
        timestamp: None,
        distance: None,
        is_checked_in: None,
    }
}
