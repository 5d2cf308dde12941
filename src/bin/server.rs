use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use linear_cut::error::CutError;
use linear_cut::render::format_percent;
use linear_cut::search::{DEFAULT_TOP, search};
use linear_cut::solver::optimize;
use linear_cut::types::{
    Demand, DemandSet, OptimizationResult, SearchRange, SearchResult, deserialize_u32_from_number,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

type ApiError = (StatusCode, String);

#[derive(Deserialize, Serialize)]
struct OptimizeRequest {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    stock_length: u32,
    cuts: Vec<Demand>,
}

#[derive(Deserialize, Serialize)]
struct SearchRequest {
    cuts: Vec<Demand>,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    min_length: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    max_length: u32,
    #[serde(default = "default_step", deserialize_with = "deserialize_u32_from_number")]
    step: u32,
    #[serde(default = "default_top")]
    top: usize,
}

fn default_step() -> u32 {
    100
}

fn default_top() -> usize {
    DEFAULT_TOP
}

#[derive(Debug, Serialize)]
struct PlanResponse {
    stock_length: u32,
    patterns: Vec<PatternResponse>,
    total_stock_used: u64,
    total_utilization: f64,
    total_waste: u64,
    summary: String,
}

#[derive(Debug, Serialize)]
struct PatternResponse {
    description: String,
    pieces: Vec<Demand>,
    repeat_count: u32,
    utilization: f64,
    waste: u32,
}

#[derive(Debug, Serialize)]
struct CandidateResponse {
    stock_length: u32,
    total_stock_used: u64,
    total_utilization: f64,
    total_waste: u64,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    candidates: Vec<CandidateResponse>,
    feasible_count: usize,
    best: PlanResponse,
}

impl PlanResponse {
    fn new(result: &OptimizationResult) -> Self {
        Self {
            stock_length: result.stock_length,
            patterns: result
                .cutting_plan
                .iter()
                .map(|e| PatternResponse {
                    description: e.pattern.to_string(),
                    pieces: e
                        .pattern
                        .pieces()
                        .map(|(length, count)| Demand::new(length, count))
                        .collect(),
                    repeat_count: e.repeat_count,
                    utilization: e.utilization,
                    waste: e.waste,
                })
                .collect(),
            total_stock_used: result.total_stock_used,
            total_utilization: result.total_utilization,
            total_waste: result.total_waste,
            summary: format!(
                "{} units, {} utilization, {} mm waste",
                result.total_stock_used,
                format_percent(result.total_utilization),
                result.total_waste
            ),
        }
    }
}

fn status_for(e: &CutError) -> StatusCode {
    match e {
        CutError::OversizedDemand { .. }
        | CutError::EmptyDemandSet
        | CutError::QuantityOverflow { .. }
        | CutError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
        CutError::NoFeasibleLength { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        CutError::InfeasibleDemand { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn cut_error(e: CutError) -> ApiError {
    let status = status_for(&e);
    if status.is_server_error() {
        tracing::error!(error = %e, "optimizer invariant violated");
    }
    (status, e.to_string())
}

fn demand_set(cuts: Vec<Demand>) -> Result<DemandSet, ApiError> {
    for c in &cuts {
        if c.length == 0 {
            return Err((
                StatusCode::BAD_REQUEST,
                "cut length must be non-zero".to_string(),
            ));
        }
        if c.qty == 0 {
            return Err((
                StatusCode::BAD_REQUEST,
                "cut quantity must be non-zero".to_string(),
            ));
        }
    }
    DemandSet::from_demands(cuts).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

/// Runs CPU-bound optimizer work off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, CutError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(cut_error)
}

async fn optimize_handler(
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    if req.stock_length == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "stock length must be non-zero".to_string(),
        ));
    }
    let demands = demand_set(req.cuts)?;
    let stock_length = req.stock_length;

    let result = blocking(move || optimize(stock_length, &demands)).await?;
    Ok(Json(PlanResponse::new(&result)))
}

async fn search_handler(
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /search"
    );

    let range = SearchRange::new(req.min_length, req.max_length, req.step);
    let demands = demand_set(req.cuts)?;
    let top = req.top;

    let results: Vec<SearchResult> = blocking(move || search(&demands, range)).await?;
    let best = &results[0];

    Ok(Json(SearchResponse {
        candidates: results
            .iter()
            .take(top)
            .map(|r| CandidateResponse {
                stock_length: r.stock_length,
                total_stock_used: r.total_stock_used,
                total_utilization: r.total_utilization,
                total_waste: r.total_waste,
            })
            .collect(),
        feasible_count: results.len(),
        best: PlanResponse::new(best),
    }))
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize_handler))
        .route("/search", post(search_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

fn main() {
    // Reads SENTRY_DSN; reporting stays off when it is unset.
    let _sentry = sentry::init(sentry::ClientOptions {
        release: sentry::release_name!(),
        ..Default::default()
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(serve());
}

async fn serve() {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app()).await.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(status_for(&CutError::EmptyDemandSet), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&CutError::OversizedDemand {
                length: 600,
                stock_length: 500
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&CutError::NoFeasibleLength {
                min_length: 1000,
                max_length: 2000
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&CutError::InfeasibleDemand { stock_length: 1000 }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_demand_set_rejects_zero() {
        let err = demand_set(vec![Demand::new(355, 0)]).unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        let set = demand_set(vec![Demand::new(355, 4), Demand::new(355, 6)]).unwrap();
        assert_eq!(set.quantity(355), 10);
    }

    #[test]
    fn test_demand_set_rejects_quantity_overflow() {
        let err = demand_set(vec![Demand::new(10, u32::MAX), Demand::new(10, 5)]).unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("10mm"));
    }

    #[tokio::test]
    async fn test_search_handler_rejects_huge_range() {
        let req = SearchRequest {
            cuts: vec![Demand::new(355, 10)],
            min_length: 1,
            max_length: u32::MAX,
            step: 1,
            top: 5,
        };
        let err = search_handler(Json(req)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_optimize_handler() {
        let req = OptimizeRequest {
            stock_length: 1000,
            cuts: vec![Demand::new(600, 1), Demand::new(400, 1)],
        };
        let Json(resp) = optimize_handler(Json(req)).await.unwrap();
        assert_eq!(resp.total_stock_used, 1);
        assert_eq!(resp.patterns.len(), 1);
        assert_eq!(resp.patterns[0].description, "1×600mm + 1×400mm");
        assert_eq!(resp.total_waste, 0);
    }

    #[tokio::test]
    async fn test_optimize_handler_oversized() {
        let req = OptimizeRequest {
            stock_length: 500,
            cuts: vec![Demand::new(600, 1)],
        };
        let err = optimize_handler(Json(req)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("600mm"));
    }

    #[tokio::test]
    async fn test_search_handler_top() {
        let req = SearchRequest {
            cuts: vec![Demand::new(355, 10)],
            min_length: 1000,
            max_length: 1200,
            step: 100,
            top: 2,
        };
        let Json(resp) = search_handler(Json(req)).await.unwrap();
        assert_eq!(resp.feasible_count, 3);
        assert_eq!(resp.candidates.len(), 2);
        assert_eq!(resp.candidates[0].stock_length, 1100);
        assert_eq!(resp.best.stock_length, 1100);
    }
}
