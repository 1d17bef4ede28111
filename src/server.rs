use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::coalition::constraints::{Constraints, Exclusion, Inclusion};
use crate::coalition::enumerate::SearchBounds;
use crate::coalition::summary::{CoalitionSummary, RankBy};
use crate::config::Config;
use crate::party::Party;
use crate::polls::PollListing;
use crate::session::Session;

#[derive(Clone)]
struct ApiState {
    config: Config,
    session: Arc<Mutex<Session>>,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

const MAX_REQUEST_PARTIES: usize = 8;

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Clone, Default, Deserialize)]
struct InitializeRequest {
    poll: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PositionRequest {
    party_name: Option<String>,
    economic: Option<f64>,
    social: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CoalitionsRequest {
    min_parties: Option<usize>,
    max_parties: Option<usize>,
    #[serde(default)]
    exclusions: Vec<Vec<String>>,
    #[serde(default)]
    inclusions: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartiesRequest {
    #[serde(default)]
    parties: Vec<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct PollsResponse {
    source: String,
    fetched_at: DateTime<Utc>,
    polls: Vec<PollListing>,
}

#[derive(Debug, Serialize)]
struct PartiesResponse {
    parties: Vec<Party>,
    total_seats: u32,
    majority_threshold: u32,
}

#[derive(Debug, Serialize)]
struct CoalitionsResponse {
    coalitions: Vec<CoalitionSummary>,
    total_count: usize,
}

#[derive(Debug, Serialize)]
struct SelectResponse {
    coalition_seats: u32,
    has_majority: bool,
    unknown: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ScoreResponse {
    parties: Vec<String>,
    compatibility: f64,
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let session = Session::from_config(&config)?;
    let app = router(ApiState {
        config,
        session: Arc::new(Mutex::new(session)),
    });

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/polls", get(polls))
        .route("/v1/initialize", post(initialize))
        .route("/v1/positions", post(update_position))
        .route("/v1/coalitions", post(coalitions))
        .route("/v1/select", post(select))
        .route("/v1/score", post(score))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse { status: "ok" })
}

async fn polls(State(state): State<ApiState>) -> ApiResult<PollsResponse> {
    let mut session = state.session.lock().await;
    let set = session.polls().await.map_err(ApiError::internal)?;
    Ok(ok(PollsResponse {
        source: set.source.clone(),
        fetched_at: set.fetched_at,
        polls: set.listing(),
    }))
}

async fn initialize(
    State(state): State<ApiState>,
    Json(request): Json<InitializeRequest>,
) -> ApiResult<PartiesResponse> {
    let mut session = state.session.lock().await;
    session.polls().await.map_err(ApiError::internal)?;
    let context = session
        .initialize(request.poll.as_deref())
        .await
        .map_err(ApiError::bad_request)?;
    Ok(ok(PartiesResponse {
        parties: context.parties().to_vec(),
        total_seats: context.total_seats(),
        majority_threshold: context.majority_threshold(),
    }))
}

async fn update_position(
    State(state): State<ApiState>,
    Json(request): Json<PositionRequest>,
) -> ApiResult<PartiesResponse> {
    let (Some(name), Some(economic), Some(social)) =
        (request.party_name, request.economic, request.social)
    else {
        return Err(ApiError::bad_request(
            "party_name, economic and social are required",
        ));
    };

    let mut session = state.session.lock().await;
    let context = session.context_mut().map_err(ApiError::bad_request)?;
    let updated = context
        .update_party_position(name.trim(), economic, social)
        .map_err(ApiError::bad_request)?;
    if !updated {
        return Err(ApiError::bad_request(format!("unknown party: {name}")));
    }
    Ok(ok(PartiesResponse {
        parties: context.parties().to_vec(),
        total_seats: context.total_seats(),
        majority_threshold: context.majority_threshold(),
    }))
}

async fn coalitions(
    State(state): State<ApiState>,
    Json(request): Json<CoalitionsRequest>,
) -> ApiResult<CoalitionsResponse> {
    let bounds = SearchBounds::new(
        request.min_parties.unwrap_or(state.config.search.min_parties),
        request.max_parties.unwrap_or(state.config.search.max_parties),
    )
    .map_err(ApiError::bad_request)?;
    let ceiling = MAX_REQUEST_PARTIES.max(state.config.search.max_parties);
    if bounds.max_size > ceiling {
        return Err(ApiError::bad_request(format!(
            "max_parties must be at most {ceiling}"
        )));
    }
    let constraints = parse_constraints(request.exclusions, request.inclusions)?;

    let context = {
        let session = state.session.lock().await;
        session.context().map_err(ApiError::bad_request)?.clone()
    };
    let coalitions = tokio::task::spawn_blocking(move || {
        context.ranked_coalitions(&constraints, bounds, RankBy::Compatibility)
    })
    .await
    .map_err(ApiError::internal)?
    .map_err(ApiError::internal)?;
    info!("found {} coalitions", coalitions.len());
    Ok(ok(CoalitionsResponse {
        total_count: coalitions.len(),
        coalitions,
    }))
}

async fn select(
    State(state): State<ApiState>,
    Json(request): Json<PartiesRequest>,
) -> ApiResult<SelectResponse> {
    let mut session = state.session.lock().await;
    let context = session.context_mut().map_err(ApiError::bad_request)?;
    let unknown = context.select_only(&request.parties);
    Ok(ok(SelectResponse {
        coalition_seats: context.coalition_seats(),
        has_majority: context.has_majority(),
        unknown,
    }))
}

async fn score(
    State(state): State<ApiState>,
    Json(request): Json<PartiesRequest>,
) -> ApiResult<ScoreResponse> {
    let session = state.session.lock().await;
    let context = session.context().map_err(ApiError::bad_request)?;
    let compatibility = context
        .score(&request.parties)
        .map_err(ApiError::bad_request)?;
    Ok(ok(ScoreResponse {
        parties: request.parties,
        compatibility,
    }))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

fn parse_constraints(
    exclusions: Vec<Vec<String>>,
    inclusions: Vec<Vec<String>>,
) -> std::result::Result<Constraints, ApiError> {
    let mut constraints = Constraints::new();
    for raw in exclusions {
        let exclusion = Exclusion::try_from(raw).map_err(ApiError::bad_request)?;
        constraints = constraints.exclude(exclusion);
    }
    for raw in inclusions {
        let inclusion = Inclusion::try_from(raw).map_err(ApiError::bad_request)?;
        constraints = constraints.include(inclusion);
    }
    Ok(constraints)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;
    use tokio::sync::Mutex;

    use super::{
        coalitions, initialize, parse_constraints, score, select, update_position, ApiState,
        CoalitionsRequest, InitializeRequest, PartiesRequest, PositionRequest,
        MAX_REQUEST_PARTIES,
    };
    use crate::config::Config;
    use crate::polls::source::StaticPollSource;
    use crate::positions::store::PositionStore;
    use crate::session::Session;

    const PAGE: &str = "<h2>Peiling</h2>PVV: 50<br>VVD: 30<br>D66: 40<br>SP: 30";

    fn state(dir: &tempfile::TempDir) -> ApiState {
        let source = StaticPollSource::from_html("fixture", PAGE).expect("fixture parses");
        let session = Session::new(
            Arc::new(source),
            PositionStore::new(dir.path().join("positions.json")),
            150,
            76,
        );
        ApiState {
            config: Config::default(),
            session: Arc::new(Mutex::new(session)),
        }
    }

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_constraint_lists() {
        let constraints = parse_constraints(
            vec![names(&["PVV"]), names(&["VVD", "D66"])],
            vec![names(&["SP", "D66"])],
        )
        .expect("valid constraints");
        assert_eq!(constraints.exclusions.len(), 2);
        assert_eq!(constraints.inclusions.len(), 1);

        let err = parse_constraints(Vec::new(), vec![names(&["SP"])]).expect_err("arity");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn endpoints_require_initialization() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state(&dir);
        tokio_test::block_on(async {
            let err = coalitions(State(state.clone()), Json(CoalitionsRequest::default()))
                .await
                .expect_err("not initialized");
            assert_eq!(err.status, StatusCode::BAD_REQUEST);

            let err = select(State(state), Json(PartiesRequest::default()))
                .await
                .expect_err("not initialized");
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        });
    }

    #[test]
    fn initialize_then_search_select_and_score() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state(&dir);
        tokio_test::block_on(async {
            let Json(init) = initialize(State(state.clone()), Json(InitializeRequest::default()))
                .await
                .expect("initialized");
            assert_eq!(init.data.total_seats, 150);
            assert_eq!(init.data.parties.len(), 4);

            let request = CoalitionsRequest {
                exclusions: vec![names(&["SP"])],
                ..CoalitionsRequest::default()
            };
            let Json(found) = coalitions(State(state.clone()), Json(request))
                .await
                .expect("coalitions");
            assert_eq!(found.data.total_count, found.data.coalitions.len());
            assert!(found
                .data
                .coalitions
                .iter()
                .all(|c| !c.parties.contains(&"SP".to_string()) && c.seats >= 76));
            for window in found.data.coalitions.windows(2) {
                assert!(window[0].compatibility >= window[1].compatibility);
            }

            let Json(selected) = select(
                State(state.clone()),
                Json(PartiesRequest {
                    parties: names(&["PVV", "VVD"]),
                }),
            )
            .await
            .expect("selected");
            assert_eq!(selected.data.coalition_seats, 80);
            assert!(selected.data.has_majority);

            let err = score(
                State(state),
                Json(PartiesRequest {
                    parties: names(&["PVV", "Nobody"]),
                }),
            )
            .await
            .expect_err("unknown party");
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        });
    }

    #[test]
    fn oversized_searches_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state(&dir);
        tokio_test::block_on(async {
            initialize(State(state.clone()), Json(InitializeRequest::default()))
                .await
                .expect("initialized");

            let request = CoalitionsRequest {
                max_parties: Some(MAX_REQUEST_PARTIES + 1),
                ..CoalitionsRequest::default()
            };
            let err = coalitions(State(state.clone()), Json(request))
                .await
                .expect_err("too many parties");
            assert_eq!(err.status, StatusCode::BAD_REQUEST);

            let request = CoalitionsRequest {
                max_parties: Some(MAX_REQUEST_PARTIES),
                ..CoalitionsRequest::default()
            };
            let Json(found) = coalitions(State(state), Json(request))
                .await
                .expect("within the limit");
            assert!(found.data.total_count > 0);
        });
    }

    #[test]
    fn position_updates_validate_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state(&dir);
        tokio_test::block_on(async {
            initialize(State(state.clone()), Json(InitializeRequest::default()))
                .await
                .expect("initialized");

            let err = update_position(State(state.clone()), Json(PositionRequest::default()))
                .await
                .expect_err("missing fields");
            assert_eq!(err.status, StatusCode::BAD_REQUEST);

            let Json(updated) = update_position(
                State(state),
                Json(PositionRequest {
                    party_name: Some("SP".to_string()),
                    economic: Some(-4.0),
                    social: Some(0.25),
                }),
            )
            .await
            .expect("updated");
            let sp = updated
                .data
                .parties
                .iter()
                .find(|p| p.name.as_str() == "SP")
                .expect("SP listed");
            assert_eq!((sp.economic(), sp.social()), (-1.0, 0.25));
        });
    }
}
