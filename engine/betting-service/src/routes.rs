//! REST routes for bet placement, bet history, and the sports data proxy

use event_gateway::{EventGatewayClient, Sport};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use wager_ledger::{
    parse_amount, LedgerError, PlaceWagerRequest, PlacementReceipt, QueryService, Store,
    TransactionCoordinator, Wager, WagerStatus,
};

/// Responses carry this so clients never cache stale balances or odds.
const NO_STORE: &str = "no-store, no-cache, must-revalidate, private";

/// Shared handler state.
pub struct AppContext<S> {
    pub coordinator: Arc<TransactionCoordinator<S>>,
    pub queries: Arc<QueryService<S>>,
    pub gateway: Arc<EventGatewayClient>,
}

impl<S> Clone for AppContext<S> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            queries: self.queries.clone(),
            gateway: self.gateway.clone(),
        }
    }
}

impl<S: Store + Clone> AppContext<S> {
    pub fn new(store: S, gateway: EventGatewayClient) -> Self {
        Self {
            coordinator: Arc::new(TransactionCoordinator::new(store.clone())),
            queries: Arc::new(QueryService::new(store)),
            gateway: Arc::new(gateway),
        }
    }
}

/// Placement body as it arrives on the wire. `stake` and `odds` may be JSON
/// numbers or numeric strings; everything else is optional here so the ledger
/// can name the missing field instead of a blanket deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceBetBody {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    sport: Option<String>,
    #[serde(default)]
    event_id: Option<String>,
    #[serde(default)]
    market: Option<String>,
    #[serde(default)]
    selection: Option<String>,
    #[serde(default)]
    odds: Option<Value>,
    #[serde(default)]
    stake: Option<Value>,
    #[serde(default)]
    extra_event_info: Option<Value>,
    #[serde(default)]
    idempotency_key: Option<String>,
}

impl PlaceBetBody {
    fn into_request(self) -> Result<PlaceWagerRequest, LedgerError> {
        let stake =
            parse_amount("stake", &self.stake.ok_or(LedgerError::Validation { field: "stake" })?)?;
        let odds =
            parse_amount("odds", &self.odds.ok_or(LedgerError::Validation { field: "odds" })?)?;

        Ok(PlaceWagerRequest {
            user_id: self.user_id.unwrap_or_default(),
            sport: self.sport.unwrap_or_default(),
            event_id: self.event_id.unwrap_or_default(),
            market: self.market,
            selection: self.selection.unwrap_or_default(),
            odds,
            stake,
            extra_event_info: self.extra_event_info,
            idempotency_key: self.idempotency_key,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyBetsQuery {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FixtureQuery {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Serialize)]
struct PlacedResponse {
    ok: bool,
    #[serde(flatten)]
    receipt: PlacementReceipt,
}

#[derive(Debug, Serialize)]
struct BetsResponse {
    ok: bool,
    bets: Vec<Wager>,
}

/// Full route tree: bets API, sports proxy, liveness root.
pub fn routes<S>(
    ctx: AppContext<S>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone
where
    S: Store + Send + Sync + 'static,
{
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    root()
        .or(place_bet(ctx.clone()))
        .or(my_bets(ctx.clone()))
        .or(football_fixture(ctx.clone()))
        .or(sport_events(ctx))
        .recover(handle_rejection)
        .with(cors)
        .with(warp::reply::with::header("cache-control", NO_STORE))
}

fn with_ctx<S: Store + Send + Sync + 'static>(
    ctx: AppContext<S>,
) -> impl Filter<Extract = (AppContext<S>,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

fn root() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path::end().and(warp::get()).map(|| {
        let sports: Vec<&str> = Sport::ALL.iter().map(|s| s.as_str()).collect();
        warp::reply::json(&json!({
            "ok": true,
            "message": "Betting API server is running",
            "sports": sports,
        }))
    })
}

fn place_bet<S: Store + Send + Sync + 'static>(
    ctx: AppContext<S>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "bets" / "place")
        .and(warp::post())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json())
        .and(with_ctx(ctx))
        .and_then(|body: PlaceBetBody, ctx: AppContext<S>| async move {
            handle_place(body, ctx).await
        })
}

async fn handle_place<S: Store>(
    body: PlaceBetBody,
    ctx: AppContext<S>,
) -> Result<impl Reply, Infallible> {
    let result = async {
        let request = body.into_request()?;
        ctx.coordinator.place_wager(&request).await
    }
    .await;

    Ok(match result {
        Ok(receipt) => warp::reply::with_status(
            warp::reply::json(&PlacedResponse { ok: true, receipt }),
            StatusCode::OK,
        ),
        Err(err) => error_reply(&err),
    })
}

fn my_bets<S: Store + Send + Sync + 'static>(
    ctx: AppContext<S>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "bets" / "my")
        .and(warp::get())
        .and(warp::query::<MyBetsQuery>())
        .and(with_ctx(ctx))
        .and_then(|query: MyBetsQuery, ctx: AppContext<S>| async move {
            handle_my_bets(query, ctx).await
        })
}

async fn handle_my_bets<S: Store>(
    query: MyBetsQuery,
    ctx: AppContext<S>,
) -> Result<impl Reply, Infallible> {
    let result = async {
        let user_id = query.user_id.unwrap_or_default();
        let status = query
            .status
            .as_deref()
            .map(str::parse::<WagerStatus>)
            .transpose()?;
        ctx.queries.list_wagers(&user_id, status).await
    }
    .await;

    Ok(match result {
        Ok(bets) => warp::reply::with_status(
            warp::reply::json(&BetsResponse { ok: true, bets }),
            StatusCode::OK,
        ),
        Err(err) => error_reply(&err),
    })
}

fn football_fixture<S: Store + Send + Sync + 'static>(
    ctx: AppContext<S>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "football" / "fixture")
        .and(warp::get())
        .and(warp::query::<FixtureQuery>())
        .and(with_ctx(ctx))
        .and_then(|query: FixtureQuery, ctx: AppContext<S>| async move {
            handle_fixture(query, ctx).await
        })
}

async fn handle_fixture<S: Store>(
    query: FixtureQuery,
    ctx: AppContext<S>,
) -> Result<impl Reply, Infallible> {
    let Some(id) = query.id.filter(|id| !id.trim().is_empty()) else {
        return Ok(warp::reply::with_status(
            warp::reply::json(&json!({"error": "fixture id is required", "response": []})),
            StatusCode::BAD_REQUEST,
        ));
    };

    Ok(match ctx.gateway.football_fixture(&id).await {
        Ok(payload) => {
            warp::reply::with_status(warp::reply::json(&payload), StatusCode::OK)
        }
        Err(err) => {
            tracing::error!(%err, fixture = %id, "football fixture fetch failed");
            warp::reply::with_status(
                warp::reply::json(&json!({"error": "football fixture error", "response": []})),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    })
}

fn sport_events<S: Store + Send + Sync + 'static>(
    ctx: AppContext<S>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let upcoming = warp::path!("api" / String / "upcoming")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and_then(|sport: String, ctx: AppContext<S>| async move {
            handle_events(sport, ctx, false).await
        });

    let live = warp::path!("api" / String / "live")
        .and(warp::get())
        .and(with_ctx(ctx))
        .and_then(|sport: String, ctx: AppContext<S>| async move {
            handle_events(sport, ctx, true).await
        });

    upcoming.or(live)
}

async fn handle_events<S: Store>(
    sport: String,
    ctx: AppContext<S>,
    live: bool,
) -> Result<impl Reply, Infallible> {
    let parsed = match sport.parse::<Sport>() {
        Ok(sport) => sport,
        Err(err) => {
            return Ok(warp::reply::with_status(
                warp::reply::json(&json!({"error": err.to_string(), "response": []})),
                StatusCode::BAD_REQUEST,
            ));
        }
    };

    let result = if live {
        ctx.gateway.live(parsed).await
    } else {
        ctx.gateway.upcoming(parsed).await
    };

    Ok(match result {
        Ok(payload) => warp::reply::with_status(warp::reply::json(&payload), StatusCode::OK),
        Err(err) => {
            let kind = if live { "live" } else { "upcoming" };
            tracing::error!(%err, sport = parsed.as_str(), kind, "provider fetch failed");
            warp::reply::with_status(
                warp::reply::json(&json!({
                    "error": format!("{} {kind} error", parsed.as_str()),
                    "response": [],
                })),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    })
}

/// Map a ledger error to a structured response. Internal detail never leaks;
/// transient storage trouble tells the caller the outcome is unknown.
fn error_reply(err: &LedgerError) -> warp::reply::WithStatus<warp::reply::Json> {
    let (status, body) = match err {
        LedgerError::Validation { .. }
        | LedgerError::UserNotFound { .. }
        | LedgerError::InsufficientFunds { .. } => {
            (StatusCode::BAD_REQUEST, json!({"error": err.to_string()}))
        }
        LedgerError::WagerNotFound { .. } => {
            (StatusCode::NOT_FOUND, json!({"error": err.to_string()}))
        }
        LedgerError::AlreadySettled { .. } => {
            (StatusCode::CONFLICT, json!({"error": err.to_string()}))
        }
        LedgerError::TransientStorage { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"error": "temporary storage error, outcome unknown"}),
        ),
        LedgerError::InvalidConfig { .. } | LedgerError::Internal { .. } => {
            tracing::error!(%err, "internal error");
            (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "internal server error"}))
        }
    };
    warp::reply::with_status(warp::reply::json(&body), status)
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found")
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        (StatusCode::BAD_REQUEST, "invalid request body")
    } else {
        tracing::error!(?err, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({"error": message})),
        status,
    ))
}
