//! Axum routes and the per-request gateway flow:
//! resolve session → rewrite follow-up → (maybe) schedule shortcut →
//! forward to the backend → refresh session state from the sources.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use scholar_core::config::GatewayConfig;
use scholar_core::constants::SESSION_SOURCE_WINDOW;
use scholar_core::errors::{GatewayError, ScholarResult};
use scholar_core::intent::Intent;
use scholar_core::models::{Confidence, CourseSchedule, QueryResult};

use crate::metrics::GatewayMetrics;
use crate::points::PayloadResolver;
use crate::rewrite::{asks_about_course_schedule, has_singular_reference, is_follow_up, rewrite_query};
use crate::session::{ConversationState, CourseRef, MemorySessionStore, SessionStore, SqliteSessionStore};

pub struct AppState {
    pub config: GatewayConfig,
    pub sessions: Arc<dyn SessionStore>,
    pub resolver: PayloadResolver,
    pub metrics: Arc<GatewayMetrics>,
    http: reqwest::Client,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> ScholarResult<Self> {
        let metrics = Arc::new(GatewayMetrics::default());
        let ttl = Duration::from_secs(config.session_ttl_secs);
        let sessions: Arc<dyn SessionStore> = match &config.session_store_path {
            Some(path) => {
                info!(path = %path, "using shared session store");
                Arc::new(SqliteSessionStore::open(path, ttl)?)
            }
            None => Arc::new(MemorySessionStore::new(ttl)),
        };
        let resolver = PayloadResolver::new(&config, metrics.clone());
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.forward_timeout_secs))
            .build()
            .map_err(|e| GatewayError::BackendUnreachable {
                reason: e.to_string(),
            })?;
        Ok(AppState {
            config,
            sessions,
            resolver,
            metrics,
            http,
        })
    }

    /// POST the (possibly rewritten) query to the backend.
    async fn forward(
        &self,
        body: &serde_json::Value,
        headers: &HeaderMap,
    ) -> ScholarResult<QueryResult> {
        let url = format!("{}/api/v1/query", self.config.backend_url.trim_end_matches('/'));
        let mut req = self.http.post(&url).json(body);
        if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
            req = req.header("x-api-key", key);
        }
        let resp = req.send().await.map_err(|e| GatewayError::BackendUnreachable {
            reason: e.to_string(),
        })?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| GatewayError::BackendUnreachable {
            reason: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(GatewayError::BackendUnreachable {
                reason: format!("backend returned {status}: {text}"),
            }
            .into());
        }
        serde_json::from_str(&text).map_err(|e| {
            GatewayError::BackendUnreachable {
                reason: format!("unparseable backend response ({e}): {text}"),
            }
            .into()
        })
    }

    /// Deterministic course-schedule lookup by title.
    /// `Ok(Some)` carries the answer sentence and its `SQL:<code>` source.
    async fn course_schedule(&self, title: &str) -> ScholarResult<Option<(String, String)>> {
        let url = format!(
            "{}/api/v1/sql/course-schedule",
            self.config.backend_url.trim_end_matches('/')
        );
        let resp = self
            .http
            .get(&url)
            .query(&[("title", title)])
            .send()
            .await
            .map_err(|e| GatewayError::BackendUnreachable {
                reason: e.to_string(),
            })?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        let schedule: CourseSchedule = match resp.json().await {
            Ok(s) => s,
            Err(_) => return Ok(None),
        };
        if !schedule.found {
            return Ok(None);
        }
        let Some(code) = schedule.course_code else {
            return Ok(None);
        };
        let answer = match schedule.range {
            Some(range) => match (range.earliest, range.latest) {
                (Some(e), Some(l)) => format!("The course {title} runs from {e} to {l}."),
                (Some(e), None) => format!("The course {title} starts on {e}."),
                (None, Some(l)) => format!("The course {title} ends on {l}."),
                (None, None) => return Ok(None),
            },
            None => return Ok(None),
        };
        Ok(Some((answer, format!("SQL:{code}"))))
    }
}

/// What to do with an incoming query given the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FollowUpPlan {
    /// Try the deterministic course-schedule endpoint first.
    ScheduleLookup(CourseRef),
    /// Forward this query text; `rewritten` marks a reference substitution.
    Forward { query: String, rewritten: bool },
}

/// Decide the follow-up handling for one query. Pure so the routing rules
/// are testable without HTTP.
pub(crate) fn plan_follow_up(query: &str, session: &ConversationState) -> FollowUpPlan {
    if is_follow_up(query) {
        if asks_about_course_schedule(query) {
            if let Some(course) = &session.active_course {
                return FollowUpPlan::ScheduleLookup(course.clone());
            }
        }
        if has_singular_reference(query) {
            if let Some(name) = &session.active_entity_name {
                let rewritten = rewrite_query(query, name);
                let changed = rewritten != query;
                return FollowUpPlan::Forward {
                    query: rewritten,
                    rewritten: changed,
                };
            }
        }
    }
    // Unresolvable follow-ups and ordinary queries forward unchanged.
    FollowUpPlan::Forward {
        query: query.to_string(),
        rewritten: false,
    }
}

/// Session id precedence: `X-Session-Id` header, body `session_id`,
/// `session_id` cookie, then a fresh UUID.
pub(crate) fn pick_session_id(
    header: Option<&str>,
    body: Option<&str>,
    cookie_header: Option<&str>,
) -> String {
    if let Some(id) = header.map(str::trim).filter(|s| !s.is_empty()) {
        return id.to_string();
    }
    if let Some(id) = body.map(str::trim).filter(|s| !s.is_empty()) {
        return id.to_string();
    }
    if let Some(cookies) = cookie_header {
        for pair in cookies.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name.trim() == "session_id" && !value.trim().is_empty() {
                    return value.trim().to_string();
                }
            }
        }
    }
    uuid::Uuid::new_v4().to_string()
}

fn extract_session_id(headers: &HeaderMap, body: &serde_json::Value) -> String {
    pick_session_id(
        headers.get("x-session-id").and_then(|v| v.to_str().ok()),
        body.get("session_id").and_then(|v| v.as_str()),
        headers.get("cookie").and_then(|v| v.to_str().ok()),
    )
}

/// Pick the payload describing the active entity: course-type wins,
/// otherwise the first resolved payload.
pub(crate) fn choose_active_payload(
    payloads: &[scholar_core::models::PointPayload],
) -> Option<&scholar_core::models::PointPayload> {
    payloads
        .iter()
        .find(|p| p.is_type("course"))
        .or_else(|| payloads.first())
}

async fn refresh_session_state(
    state: &AppState,
    session: &mut ConversationState,
    result: &QueryResult,
) {
    let top: Vec<String> = result
        .sources
        .iter()
        .take(SESSION_SOURCE_WINDOW)
        .cloned()
        .collect();

    let mut payloads = Vec::new();
    for id in &top {
        // Synthetic relational ids have no vector points behind them.
        if id.starts_with("SQL-") || id.starts_with("SQL:") {
            continue;
        }
        if let Some(payload) = state.resolver.resolve(id).await {
            payloads.push(payload);
        }
    }

    if let Some(payload) = choose_active_payload(&payloads).cloned() {
        let display_name = if payload.title.is_empty() {
            payload.chunk_id.clone()
        } else {
            payload.title.clone()
        };
        session.active_entity_id = Some(payload.chunk_id.clone());
        session.active_entity_name = Some(display_name.clone());
        session.active_entity_type = Some(payload.chunk_type.clone());

        if payload.is_type("course") {
            session.active_course = Some(CourseRef {
                chunk_id: payload.chunk_id.clone(),
                title: display_name,
            });
        } else if payload.is_type("class") {
            let owner = payload
                .metadata
                .get("course_chunk_id")
                .or_else(|| payload.metadata.get("course_id"))
                .and_then(|v| v.as_str())
                .map(str::to_string);
            if let Some(owner_id) = owner {
                if let Some(course) = state.resolver.resolve(&owner_id).await {
                    session.active_course = Some(CourseRef {
                        chunk_id: course.chunk_id.clone(),
                        title: if course.title.is_empty() {
                            course.chunk_id
                        } else {
                            course.title
                        },
                    });
                }
            }
        }
        GatewayMetrics::incr(&state.metrics.state_updates);
    }

    session.last_sources = top;
    session.last_payloads = payloads;
}

fn respond_json(session_id: &str, status: StatusCode, value: serde_json::Value) -> Response {
    let mut resp = (status, Json(value)).into_response();
    if let Ok(v) = HeaderValue::from_str(session_id) {
        resp.headers_mut().insert("x-session-id", v);
    }
    resp
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    GatewayMetrics::incr(&state.metrics.requests);

    let Some(query) = body
        .get("query")
        .and_then(|q| q.as_str())
        .map(str::trim)
        .filter(|q| !q.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "request body must carry a non-empty 'query'" })),
        )
            .into_response();
    };

    let session_id = extract_session_id(&headers, &body);
    let mut session = state
        .sessions
        .get(&session_id)
        .ok()
        .flatten()
        .unwrap_or_default();

    let mut effective = query.to_string();
    match plan_follow_up(query, &session) {
        FollowUpPlan::ScheduleLookup(course) => {
            match state.course_schedule(&course.title).await {
                Ok(Some((answer, source))) => {
                    GatewayMetrics::incr(&state.metrics.schedule_shortcuts);
                    debug!(course = %course.title, "course-schedule shortcut hit");
                    let result = QueryResult {
                        answer,
                        sources: vec![source],
                        intent: Intent::Factual,
                        confidence: Confidence::High,
                        sql: None,
                        retrieval_chain: None,
                    };
                    let _ = state.sessions.put(&session_id, &session);
                    return respond_json(
                        &session_id,
                        StatusCode::OK,
                        serde_json::to_value(&result).unwrap_or_default(),
                    );
                }
                _ => {
                    // No authoritative schedule row; point the RAG backend
                    // at the course instead of the pronoun.
                    let rewritten = rewrite_query(query, &course.title);
                    if rewritten != query {
                        GatewayMetrics::incr(&state.metrics.rewrites);
                        effective = rewritten;
                    }
                }
            }
        }
        FollowUpPlan::Forward { query: q, rewritten } => {
            if rewritten {
                GatewayMetrics::incr(&state.metrics.rewrites);
                debug!(original = query, rewritten = %q, "rewrote follow-up");
            }
            effective = q;
        }
    }

    let forward_body = json!({
        "query": effective,
        "history": body.get("history"),
        "session_id": session_id,
    });

    let result = match state.forward(&forward_body, &headers).await {
        Ok(result) => result,
        Err(e) => {
            GatewayMetrics::incr(&state.metrics.backend_errors);
            warn!(error = %e, "backend forward failed");
            // The interaction still refreshes the session TTL.
            let _ = state.sessions.put(&session_id, &session);
            return respond_json(
                &session_id,
                StatusCode::BAD_GATEWAY,
                json!({ "error": e.to_string() }),
            );
        }
    };

    refresh_session_state(&state, &mut session, &result).await;
    if let Err(e) = state.sessions.put(&session_id, &session) {
        warn!(error = %e, "failed to persist session state");
    }

    respond_json(
        &session_id,
        StatusCode::OK,
        serde_json::to_value(&result).unwrap_or_default(),
    )
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn ready_handler(State(state): State<Arc<AppState>>) -> Response {
    let backend_url = format!(
        "{}/api/v1/health",
        state.config.backend_url.trim_end_matches('/')
    );
    let backend_ok = state
        .http
        .get(&backend_url)
        .send()
        .await
        .map(|r| r.status().is_success())
        .unwrap_or(false);
    let vector_ok = state.resolver.ready().await;

    let body = json!({
        "ready": backend_ok && vector_ok,
        "backend": backend_ok,
        "vector_store": vector_ok,
    });
    let status = if backend_ok && vector_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.metrics.snapshot())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/query", post(query_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(config: GatewayConfig) -> ScholarResult<()> {
    let addr = config.listen_addr.clone();
    let state = Arc::new(AppState::new(config)?);
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| GatewayError::BackendUnreachable {
            reason: format!("failed to bind {addr}: {e}"),
        })?;
    info!(%addr, "gateway listening");
    axum::serve(listener, router)
        .await
        .map_err(|e| {
            GatewayError::BackendUnreachable {
                reason: e.to_string(),
            }
            .into()
        })
}
