//! Decision service: the request boundary around the core pipeline.
//!
//! Takes raw JSON bodies plus an optional idempotency key and returns
//! HTTP-shaped responses. Transport is left to the embedder; this layer owns
//! parsing, validation, idempotent replay and response encoding.

use std::collections::BTreeMap;

use decisionlab_core::schema::validate_request;
use decisionlab_core::{
    AgentContextRequest, DecisionOrchestrator, HealthResponse, Predictor,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, IdempotencyCache};
use crate::config::ServiceConfig;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Status, headers and body as they would go on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn json(status: u16, body: String, request_id: Option<&str>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), CONTENT_TYPE_JSON.to_string());
        if let Some(id) = request_id {
            headers.insert("x-request-id".to_string(), id.to_string());
        }
        Self {
            status,
            headers,
            body,
        }
    }

    fn error(status: u16, kind: &str, detail: Vec<String>) -> Self {
        let body = json!({ "error": kind, "detail": detail }).to_string();
        Self::json(status, body, None)
    }
}

impl From<CacheEntry> for HttpResponse {
    fn from(entry: CacheEntry) -> Self {
        Self {
            status: entry.status,
            headers: entry.headers,
            body: entry.body,
        }
    }
}

impl From<&HttpResponse> for CacheEntry {
    fn from(response: &HttpResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
        }
    }
}

/// One request in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCall {
    pub body: String,
    pub idempotency_key: Option<String>,
}

#[derive(Debug)]
pub struct DecisionService {
    orchestrator: DecisionOrchestrator,
    cache: IdempotencyCache,
}

impl DecisionService {
    pub fn new(orchestrator: DecisionOrchestrator, cache: IdempotencyCache) -> Self {
        Self {
            orchestrator,
            cache,
        }
    }

    /// Wire up predictor, orchestrator and cache from configuration.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let predictor = Predictor::load(config.model.path.as_deref());
        let orchestrator = DecisionOrchestrator::new(config.orchestrator_config(), predictor);
        let cache = IdempotencyCache::from_config(&config.cache);
        Self::new(orchestrator, cache)
    }

    pub fn orchestrator(&self) -> &DecisionOrchestrator {
        &self.orchestrator
    }

    pub fn cache(&self) -> &IdempotencyCache {
        &self.cache
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse::healthy(
            self.orchestrator.predictor().is_model_loaded(),
            &self.orchestrator.config().model_version,
            self.cache.is_available(),
        )
    }

    /// Handle one request body.
    ///
    /// With a key and an available cache, a stored response is replayed
    /// verbatim. Fresh 2xx responses are stored under the key; errors never
    /// are.
    pub fn predict(&self, body: &str, idempotency_key: Option<&str>) -> HttpResponse {
        if let Some(key) = idempotency_key {
            if let Some(entry) = self.cache.get(key) {
                info!(key, status = entry.status, "idempotent replay");
                return entry.into();
            }
        }

        let response = self.handle(body);

        if let Some(key) = idempotency_key {
            if response.is_success() && self.cache.set(key, &CacheEntry::from(&response)) {
                info!(key, "stored response for idempotent replay");
            }
        }
        response
    }

    /// Handle independent requests in parallel; output order matches input.
    pub fn predict_batch(&self, calls: &[BatchCall]) -> Vec<HttpResponse> {
        calls
            .par_iter()
            .map(|call| self.predict(&call.body, call.idempotency_key.as_deref()))
            .collect()
    }

    fn handle(&self, body: &str) -> HttpResponse {
        let request: AgentContextRequest = match serde_json::from_str(body) {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "rejecting malformed request body");
                return HttpResponse::error(422, "invalid_request", vec![e.to_string()]);
            }
        };
        if let Err(e) = validate_request(&request) {
            debug!(request_id = %request.request_id, error = %e, "rejecting request");
            return HttpResponse::error(422, "validation_error", e.errors);
        }

        let decision = self.orchestrator.decide(&request);
        match serde_json::to_string(&decision) {
            Ok(body) => HttpResponse::json(200, body, Some(&decision.request_id)),
            Err(e) => {
                warn!(request_id = %decision.request_id, error = %e, "failed to encode response");
                HttpResponse::error(500, "internal_error", vec![e.to_string()])
            }
        }
    }
}
