//! JSON API over the query facade. Every handler resolves through the shared
//! `CodexContext`; errors are mapped to status codes here and nowhere else.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use codex_core::{
    CodexContext, CodexError, CollectionKey, ComparisonReport, Entity, EntityId, SearchFilters, UpgradeCost,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

pub type AppState = Arc<CodexContext>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/stats", get(stats_handler))
        .route("/api/v1/refresh", post(refresh_handler))
        .route("/api/v1/cache/invalidate", post(invalidate_handler))
        .route("/api/v1/:collection", get(list_handler))
        .route("/api/v1/:collection/source", get(source_handler))
        .route("/api/v1/:collection/search", get(search_handler))
        .route("/api/v1/:collection/where", get(where_handler))
        .route("/api/v1/:collection/range", get(range_handler))
        .route("/api/v1/:collection/count", get(count_handler))
        .route("/api/v1/:collection/compare", get(compare_handler))
        .route("/api/v1/:collection/facets", get(facets_handler))
        .route("/api/v1/:collection/item/:id", get(item_handler))
        .route("/api/v1/:collection/item/:id/upgrade-cost", get(upgrade_cost_handler))
        .with_state(state)
        .layer(axum::middleware::from_fn(log_requests))
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        target: "codex::gateway",
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// Errors a handler can return.
pub enum ApiError {
    Codex(CodexError),
    /// Request is well-formed but not valid for the addressed collection.
    BadRequest(String),
}

impl From<CodexError> for ApiError {
    fn from(e: CodexError) -> Self {
        Self::Codex(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Codex(e) => {
                let status = match &e {
                    CodexError::UnknownCollection(_) => StatusCode::BAD_REQUEST,
                    CodexError::EntityNotFound { .. } => StatusCode::NOT_FOUND,
                    CodexError::DataUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    CodexError::Store(_) | CodexError::Serialization(_) | CodexError::Config(_) => {
                        tracing::error!(target: "codex::gateway", error = %e, "Internal error");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn collection(raw: &str) -> Result<CollectionKey, ApiError> {
    Ok(raw.parse::<CollectionKey>()?)
}

fn ships_only(raw: &str) -> Result<(), ApiError> {
    match collection(raw)? {
        CollectionKey::Ships => Ok(()),
        other => Err(ApiError::BadRequest(format!("{} has no ship endpoints", other))),
    }
}

/// Query values are read as JSON literals when they parse (`2`, `true`), else as strings.
fn query_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn health() -> &'static str {
    "OK"
}

async fn stats_handler(State(ctx): State<AppState>) -> Json<Value> {
    let stats = ctx.query.stats().await;
    let cache: Vec<_> = CollectionKey::all()
        .into_iter()
        .filter_map(|key| ctx.cache.entry_info(key))
        .collect();
    Json(json!({ "stats": stats, "cache": cache, "version": codex_core::version() }))
}

async fn refresh_handler(State(ctx): State<AppState>) -> Json<Value> {
    let outcomes = ctx.cache.refresh_all().await;
    Json(json!({ "refreshed": outcomes }))
}

#[derive(Deserialize)]
struct InvalidateParams {
    collection: Option<String>,
}

async fn invalidate_handler(
    State(ctx): State<AppState>,
    Query(params): Query<InvalidateParams>,
) -> ApiResult<Value> {
    let key = params.collection.as_deref().map(collection).transpose()?;
    ctx.cache.invalidate(key);
    Ok(Json(json!({ "invalidated": key.map_or_else(|| "all".to_string(), |k| k.to_string()) })))
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    refresh: bool,
}

async fn list_handler(
    State(ctx): State<AppState>,
    Path(raw): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Entity>> {
    let key = collection(&raw)?;
    Ok(Json(ctx.query.all(key, params.refresh).await.to_vec()))
}

async fn source_handler(State(ctx): State<AppState>, Path(raw): Path<String>) -> ApiResult<Value> {
    let key = collection(&raw)?;
    Ok(Json(json!({
        "collection": key,
        "hasOverride": ctx.cache.has_override_data(key),
        "source": ctx.cache.data_source(key),
        "cache": ctx.cache.entry_info(key),
    })))
}

async fn search_handler(
    State(ctx): State<AppState>,
    Path(raw): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Entity>> {
    let key = collection(&raw)?;
    let q = params.get("q").map(String::as_str).unwrap_or("");
    let filters = SearchFilters::from_pairs(params.iter().filter(|(k, _)| k.as_str() != "q"));
    Ok(Json(ctx.query.search(key, q, &filters).await))
}

#[derive(Deserialize)]
struct WhereParams {
    field: String,
    value: String,
}

async fn where_handler(
    State(ctx): State<AppState>,
    Path(raw): Path<String>,
    Query(params): Query<WhereParams>,
) -> ApiResult<Vec<Entity>> {
    let key = collection(&raw)?;
    let value = query_value(&params.value);
    Ok(Json(ctx.query.by_equality(key, &params.field, &value).await))
}

#[derive(Deserialize)]
struct RangeParams {
    field: String,
    min: Option<f64>,
    max: Option<f64>,
}

async fn range_handler(
    State(ctx): State<AppState>,
    Path(raw): Path<String>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Vec<Entity>> {
    let key = collection(&raw)?;
    Ok(Json(ctx.query.by_range(key, &params.field, params.min, params.max).await))
}

#[derive(Deserialize)]
struct CountParams {
    field: String,
}

async fn count_handler(
    State(ctx): State<AppState>,
    Path(raw): Path<String>,
    Query(params): Query<CountParams>,
) -> ApiResult<Value> {
    let key = collection(&raw)?;
    let counts = ctx.query.count_by(key, &params.field).await;
    Ok(Json(json!({ "field": params.field, "counts": counts })))
}

#[derive(Deserialize)]
struct CompareParams {
    a: String,
    b: String,
}

async fn compare_handler(
    State(ctx): State<AppState>,
    Path(raw): Path<String>,
    Query(params): Query<CompareParams>,
) -> ApiResult<ComparisonReport> {
    let key = collection(&raw)?;
    let report = ctx
        .query
        .compare(key, &EntityId::parse(&params.a), &EntityId::parse(&params.b))
        .await?;
    Ok(Json(report))
}

async fn facets_handler(State(ctx): State<AppState>, Path(raw): Path<String>) -> ApiResult<Value> {
    ships_only(&raw)?;
    Ok(Json(json!({
        "systems": ctx.query.systems_info().await,
        "classes": ctx.query.classes_info().await,
        "featured": ctx.query.featured_ships().await.len(),
        "popular": ctx.query.popular_ships().await.len(),
        "hybrid": ctx.query.hybrid_ships().await.len(),
        "special": ctx.query.special_ships().await.len(),
    })))
}

async fn item_handler(
    State(ctx): State<AppState>,
    Path((raw, id)): Path<(String, String)>,
) -> ApiResult<Entity> {
    let key = collection(&raw)?;
    let id = EntityId::parse(&id);
    match ctx.query.by_id(key, &id).await {
        Some(entity) => Ok(Json(entity)),
        None => Err(CodexError::EntityNotFound {
            collection: key.to_string(),
            id: id.to_string(),
        }
        .into()),
    }
}

async fn upgrade_cost_handler(
    State(ctx): State<AppState>,
    Path((raw, id)): Path<(String, String)>,
) -> ApiResult<UpgradeCost> {
    ships_only(&raw)?;
    Ok(Json(ctx.query.upgrade_cost(&EntityId::parse(&id)).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codex_core::{CodexConfig, CodexResult, OverrideStore, RemoteSource};
    use tower::ServiceExt;

    struct FixtureRemote;

    #[async_trait]
    impl RemoteSource for FixtureRemote {
        fn location(&self, key: CollectionKey) -> String {
            format!("fixture://{}", key.endpoint())
        }

        async fn fetch(&self, key: CollectionKey) -> CodexResult<Value> {
            match key {
                CollectionKey::Ships => Ok(json!({
                    "ships": [
                        {"id": 1, "name": "Starling", "type": "fighter", "system": "sol", "speed": 120, "credits": 5000, "featured": true},
                        {"id": 2, "name": "Bulwark", "type": "tank", "system": "vega", "speed": 100, "hull": 400}
                    ]
                })),
                CollectionKey::Planets => Ok(json!({
                    "planets": [
                        {"id": "terra", "name": "Terra", "level": 1},
                        {"id": "kepler", "name": "Kepler Prime", "level": 30}
                    ]
                })),
                other => Err(CodexError::DataUnavailable {
                    collection: other.to_string(),
                    reason: "HTTP 404 Not Found".to_string(),
                }),
            }
        }
    }

    fn app() -> Router {
        let store = Arc::new(OverrideStore::temporary().unwrap());
        let ctx = CodexContext::with_parts(CodexConfig::default(), store, Arc::new(FixtureRemote));
        router(Arc::new(ctx))
    }

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn lists_normalized_ships() {
        let (status, body) = call(app(), "GET", "/api/v1/ships").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["classes"], json!(["fighter"]));
    }

    #[tokio::test]
    async fn unknown_collection_is_bad_request() {
        let (status, body) = call(app(), "GET", "/api/v1/missions").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("missions"));
    }

    #[tokio::test]
    async fn item_lookup_and_not_found() {
        let (status, body) = call(app(), "GET", "/api/v1/planets/item/kepler").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Kepler Prime");

        let (status, _) = call(app(), "GET", "/api/v1/ships/item/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_passes_filters() {
        let (status, body) = call(app(), "GET", "/api/v1/ships/search?q=&system=vega").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "Bulwark");
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn where_and_range_queries() {
        let (_, body) = call(app(), "GET", "/api/v1/ships/where?field=classes&value=tank").await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = call(app(), "GET", "/api/v1/planets/range?field=level&min=10").await;
        assert_eq!(body[0]["id"], "kepler");
    }

    #[tokio::test]
    async fn compare_reports_speed_winner() {
        let (status, body) = call(app(), "GET", "/api/v1/ships/compare?a=1&b=2").await;
        assert_eq!(status, StatusCode::OK);
        let speed = body["attributes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["attribute"] == "speed")
            .unwrap();
        assert_eq!(speed["difference"], json!(20.0));
        assert_eq!(speed["winner"], "a");
    }

    #[tokio::test]
    async fn facets_are_ships_only() {
        let (status, body) = call(app(), "GET", "/api/v1/ships/facets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["systems"], json!(["sol", "vega"]));
        assert_eq!(body["featured"], 1);

        let (status, body) = call(app(), "GET", "/api/v1/planets/facets").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "planets has no ship endpoints");

        let (status, body) = call(app(), "GET", "/api/v1/systems/item/sol/upgrade-cost").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body["error"].as_str().unwrap().contains("Unknown collection"));
    }

    #[tokio::test]
    async fn refresh_reports_unavailable_collections() {
        let (status, body) = call(app(), "POST", "/api/v1/refresh").await;
        assert_eq!(status, StatusCode::OK);
        let outcomes = body["refreshed"].as_array().unwrap();
        assert_eq!(outcomes.len(), 4);
        let systems = outcomes.iter().find(|o| o["collection"] == "systems").unwrap();
        assert!(systems["error"].is_string());
    }

    #[tokio::test]
    async fn invalidate_rejects_unknown_collection() {
        let (status, body) = call(app(), "POST", "/api/v1/cache/invalidate?collection=ships").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["invalidated"], "ships");

        let (status, _) = call(app(), "POST", "/api/v1/cache/invalidate?collection=moons").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn source_reports_remote_location() {
        let (_, body) = call(app(), "GET", "/api/v1/systems/source").await;
        assert_eq!(body["hasOverride"], false);
        assert_eq!(body["source"]["kind"], "remote");
        assert_eq!(body["source"]["location"], "fixture://data/systems.json");
    }
}
