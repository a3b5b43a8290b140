//! REST API behavior against the in-memory store.

use betting_service::{routes, AppContext};
use event_gateway::{EventGatewayClient, GatewayConfig};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use wager_ledger::{LedgerConfig, MemoryStore};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn context() -> (MemoryStore, AppContext<MemoryStore>) {
    let store = MemoryStore::new(LedgerConfig::default());
    let gateway = EventGatewayClient::new(GatewayConfig::default()).unwrap();
    let ctx = AppContext::new(store.clone(), gateway);
    (store, ctx)
}

fn amount(body: &Value, field: &str) -> Decimal {
    body[field].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn root_reports_liveness_and_sports() {
    let (_, ctx) = context();
    let api = routes(ctx);

    let resp = warp::test::request().method("GET").path("/").reply(&api).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["cache-control"], "no-store, no-cache, must-revalidate, private");

    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["ok"], true);
    assert!(body["sports"].as_array().unwrap().iter().any(|s| s == "football"));
}

#[tokio::test]
async fn placing_a_bet_returns_receipt_and_debits_balance() {
    let (store, ctx) = context();
    store.seed_user("u1", dec("100"));
    let api = routes(ctx);

    let resp = warp::test::request()
        .method("POST")
        .path("/api/bets/place")
        .json(&json!({
            "userId": "u1",
            "sport": "football",
            "eventId": "fixture-1",
            "selection": "home",
            "odds": 2.5,
            "stake": 40,
        }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 200);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["ok"], true);
    assert!(body["betId"].is_string());
    assert_eq!(amount(&body, "newBalance"), dec("60"));
    assert_eq!(amount(&body, "potentialWin"), dec("100"));
}

#[tokio::test]
async fn stake_may_arrive_as_a_string() {
    let (store, ctx) = context();
    store.seed_user("u1", dec("100"));
    let api = routes(ctx);

    let resp = warp::test::request()
        .method("POST")
        .path("/api/bets/place")
        .json(&json!({
            "userId": "u1",
            "sport": "cs2",
            "eventId": "match-7",
            "selection": "navi",
            "odds": "1.8",
            "stake": "25",
        }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 200);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(amount(&body, "newBalance"), dec("75"));
}

#[tokio::test]
async fn insufficient_balance_is_a_400_and_keeps_the_balance() {
    let (store, ctx) = context();
    store.seed_user("u1", dec("50"));
    let api = routes(ctx);

    let resp = warp::test::request()
        .method("POST")
        .path("/api/bets/place")
        .json(&json!({
            "userId": "u1",
            "sport": "football",
            "eventId": "fixture-1",
            "selection": "home",
            "odds": 2.0,
            "stake": 60,
        }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 400);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Not enough balance"));

    use wager_ledger::Store;
    assert_eq!(store.get_balance("u1").await.unwrap(), Some(dec("50")));
}

#[tokio::test]
async fn negative_stake_is_rejected_by_field() {
    let (store, ctx) = context();
    store.seed_user("u1", dec("100"));
    let api = routes(ctx);

    let resp = warp::test::request()
        .method("POST")
        .path("/api/bets/place")
        .json(&json!({
            "userId": "u1",
            "sport": "football",
            "eventId": "fixture-1",
            "selection": "home",
            "odds": 2.0,
            "stake": -5,
        }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 400);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["error"], "Invalid stake");
}

#[tokio::test]
async fn unknown_user_is_a_400() {
    let (_, ctx) = context();
    let api = routes(ctx);

    let resp = warp::test::request()
        .method("POST")
        .path("/api/bets/place")
        .json(&json!({
            "userId": "ghost",
            "sport": "football",
            "eventId": "fixture-1",
            "selection": "home",
            "odds": 2.0,
            "stake": 10,
        }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 400);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert!(body["error"].as_str().unwrap().contains("User not found"));
}

#[tokio::test]
async fn my_bets_lists_and_filters() {
    let (store, ctx) = context();
    store.seed_user("u1", dec("100"));
    let api = routes(ctx);

    for event in ["e1", "e2"] {
        let resp = warp::test::request()
            .method("POST")
            .path("/api/bets/place")
            .json(&json!({
                "userId": "u1",
                "sport": "hockey",
                "eventId": event,
                "selection": "home",
                "odds": 3.0,
                "stake": 10,
            }))
            .reply(&api)
            .await;
        assert_eq!(resp.status(), 200);
    }

    let resp = warp::test::request()
        .method("GET")
        .path("/api/bets/my?userId=u1")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    let bets = body["bets"].as_array().unwrap();
    assert_eq!(bets.len(), 2);
    // Newest first.
    assert_eq!(bets[0]["eventId"], "e2");

    let resp = warp::test::request()
        .method("GET")
        .path("/api/bets/my?userId=u1&status=won")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert!(body["bets"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn my_bets_requires_user_id() {
    let (_, ctx) = context();
    let api = routes(ctx);

    let resp = warp::test::request().method("GET").path("/api/bets/my").reply(&api).await;
    assert_eq!(resp.status(), 400);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["error"], "Invalid userId");
}

#[tokio::test]
async fn bad_status_filter_is_a_400() {
    let (store, ctx) = context();
    store.seed_user("u1", dec("100"));
    let api = routes(ctx);

    let resp = warp::test::request()
        .method("GET")
        .path("/api/bets/my?userId=u1&status=settled")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn unknown_sport_is_a_400() {
    let (_, ctx) = context();
    let api = routes(ctx);

    let resp = warp::test::request()
        .method("GET")
        .path("/api/curling/upcoming")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Unknown sport"));
    assert!(body["response"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn fixture_route_requires_an_id() {
    let (_, ctx) = context();
    let api = routes(ctx);

    let resp = warp::test::request()
        .method("GET")
        .path("/api/football/fixture")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["error"], "fixture id is required");
}
