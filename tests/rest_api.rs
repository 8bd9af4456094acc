//! REST API integration tests. Spawn the server and call endpoints with reqwest.

use rust_decimal::Decimal;
use std::net::SocketAddr;
use toy_stock_exchange::api;
use toy_stock_exchange::auth::AuthConfig;
use toy_stock_exchange::Engine;

async fn spawn_app_with(auth: AuthConfig) -> (SocketAddr, api::AppState, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mut engine = Engine::new();
    engine.create_instrument("XYZ");
    let state = api::create_app_state(engine);
    let app = api::create_router(state.clone(), auth);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    (addr, state, handle)
}

async fn spawn_app() -> (SocketAddr, api::AppState, tokio::task::JoinHandle<()>) {
    spawn_app_with(AuthConfig::disabled()).await
}

async fn get_json(client: &reqwest::Client, url: String) -> (u16, serde_json::Value) {
    let response = client.get(&url).send().await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

fn dec(value: &serde_json::Value) -> Decimal {
    value.as_str().expect("decimal as string").parse().unwrap()
}

async fn register(client: &reqwest::Client, addr: SocketAddr, name: &str, money: &str) -> String {
    let (status, json) = get_json(client, format!("http://{}/register/{}/pw/{}", addr, name, money)).await;
    assert_eq!(status, 200);
    json["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_returns_ok() {
    let (addr, _state, _handle) = spawn_app().await;
    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn root_reports_version() {
    let (addr, _state, _handle) = spawn_app().await;
    let client = reqwest::Client::new();
    let (status, json) = get_json(&client, format!("http://{}/", addr)).await;
    assert_eq!(status, 200);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["since"].as_u64().is_some());
}

#[tokio::test]
async fn register_login_status_logout() {
    let (addr, _state, _handle) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register(&client, addr, "alice", "1000").await;

    let (status, json) = get_json(&client, format!("http://{}/trader/{}", addr, token)).await;
    assert_eq!(status, 200);
    assert_eq!(dec(&json["cash"]), Decimal::from(1000));
    assert!(json.get("secret_hash").is_none());

    let (status, json) = get_json(&client, format!("http://{}/login/alice/pw", addr)).await;
    assert_eq!(status, 200);
    let second = json["token"].as_str().unwrap().to_string();
    assert_ne!(second, token);

    let (status, json) = get_json(&client, format!("http://{}/logout/{}", addr, token)).await;
    assert_eq!(status, 200);
    assert_eq!(json["ok"], true);

    let (status, json) = get_json(&client, format!("http://{}/trader/{}", addr, token)).await;
    assert_eq!(status, 401);
    assert_eq!(json["error"], "INVALID_TOKEN");
    let (status, _) = get_json(&client, format!("http://{}/trader/{}", addr, second)).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn duplicate_register_and_bad_login_are_rejected() {
    let (addr, _state, _handle) = spawn_app().await;
    let client = reqwest::Client::new();
    register(&client, addr, "bob", "10").await;
    let (status, json) = get_json(&client, format!("http://{}/register/bob/pw/10", addr)).await;
    assert_eq!(status, 409);
    assert_eq!(json["error"], "DUPLICATE_TRADER");
    let (status, json) = get_json(&client, format!("http://{}/register/carol/pw/lots", addr)).await;
    assert_eq!(status, 400);
    assert_eq!(json["error"], "INVALID_AMOUNT");
    let (status, json) = get_json(&client, format!("http://{}/login/bob/nope", addr)).await;
    assert_eq!(status, 401);
    assert_eq!(json["error"], "AUTHENTICATION_FAILED");
}

#[tokio::test]
async fn bid_rests_and_shows_in_aggregated_book() {
    let (addr, _state, _handle) = spawn_app().await;
    let client = reqwest::Client::new();
    let a = register(&client, addr, "a", "100").await;
    let b = register(&client, addr, "b", "100").await;
    for (token, price) in [(&a, "30"), (&b, "30")] {
        let (status, _) = get_json(&client, format!("http://{}/bid/{}/XYZ/{}/1", addr, token, price)).await;
        assert_eq!(status, 200);
    }
    let (status, json) = get_json(&client, format!("http://{}/stock/XYZ", addr)).await;
    assert_eq!(status, 200);
    let bids = json["bids"].as_array().unwrap();
    assert_eq!(bids.len(), 1);
    assert_eq!(dec(&bids[0]["price"]), Decimal::from(30));
    assert_eq!(bids[0]["quantity"], 2);
    assert_eq!(json["asks"], serde_json::json!([]));

    let (_, json) = get_json(&client, format!("http://{}/stock", addr)).await;
    assert_eq!(json, serde_json::json!(["XYZ"]));
}

#[tokio::test]
async fn order_validation_errors() {
    let (addr, _state, _handle) = spawn_app().await;
    let client = reqwest::Client::new();
    let a = register(&client, addr, "a", "10").await;
    let cases = [
        (format!("/bid/{}/XYZ/20/1", a), 422, "INSUFFICIENT_FUNDS"),
        (format!("/ask/{}/XYZ/20/1", a), 422, "INSUFFICIENT_HOLDINGS"),
        (format!("/bid/{}/NOPE/1/1", a), 404, "UNKNOWN_INSTRUMENT"),
        (format!("/bid/{}/XYZ/-1/1", a), 400, "INVALID_PRICE"),
        (format!("/bid/{}/XYZ/1/x", a), 400, "INVALID_QUANTITY"),
        ("/bid/not-a-token/XYZ/1/1".to_string(), 401, "INVALID_TOKEN"),
    ];
    for (path, status, code) in cases {
        let (got, json) = get_json(&client, format!("http://{}{}", addr, path)).await;
        assert_eq!(got, status, "{}", path);
        assert_eq!(json["error"], code, "{}", path);
    }
    let (_, json) = get_json(&client, format!("http://{}/stats", addr)).await;
    assert_eq!(json["queued_orders"], 0);
}

#[tokio::test]
async fn tick_produces_transaction_visible_over_http() {
    let (addr, state, _handle) = spawn_app().await;
    let client = reqwest::Client::new();
    let a = register(&client, addr, "a", "1000").await;
    let b = register(&client, addr, "b", "1000").await;
    state.engine.lock().unwrap().grant_shares("b", "XYZ", 5).unwrap();

    get_json(&client, format!("http://{}/ask/{}/XYZ/50/2", addr, b)).await;
    get_json(&client, format!("http://{}/bid/{}/XYZ/60/2", addr, a)).await;
    state.engine.lock().unwrap().tick();

    let (_, json) = get_json(&client, format!("http://{}/transactions", addr)).await;
    let txs = json.as_array().unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0]["seller"], "b");
    assert_eq!(txs[0]["buyer"], "a");
    assert_eq!(dec(&txs[0]["price"]), Decimal::from(50));
    assert_eq!(txs[0]["quantity"], 2);

    let (_, json) = get_json(&client, format!("http://{}/trader/{}", addr, a)).await;
    assert_eq!(dec(&json["cash"]), Decimal::from(900));
    assert_eq!(json["holdings"]["XYZ"], 2);

    let (_, json) = get_json(&client, format!("http://{}/stats", addr)).await;
    assert_eq!(json["traders"], 2);
    assert_eq!(json["live_tokens"], 2);
    assert_eq!(json["instruments"], 1);
    assert_eq!(json["queued_orders"], 0);
}

#[tokio::test]
async fn admin_routes_require_key_when_configured() {
    let (addr, _state, _handle) = spawn_app_with(AuthConfig::from_keys("s3cret")).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/admin/instruments", addr);
    let body = serde_json::json!({ "name": "ABC" });

    let response = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(response.status(), 401);
    let response = client
        .post(&url)
        .header("X-API-Key", "wrong")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client.post(&url).bearer_auth("s3cret").json(&body).send().await.unwrap();
    assert_eq!(response.status(), 201);
    let response = client.post(&url).bearer_auth("s3cret").json(&body).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["created"], false);

    let (_, json) = get_json(&client, format!("http://{}/stock", addr)).await;
    assert_eq!(json, serde_json::json!(["ABC", "XYZ"]));
}

#[tokio::test]
async fn admin_grant_enables_ask() {
    let (addr, _state, _handle) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register(&client, addr, "seller", "0").await;
    let grant = serde_json::json!({ "trader": "seller", "instrument": "XYZ", "quantity": 3 });
    let response = client
        .post(format!("http://{}/admin/grants", addr))
        .json(&grant)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let (status, _) = get_json(&client, format!("http://{}/ask/{}/XYZ/5/3", addr, token)).await;
    assert_eq!(status, 200);

    let missing = serde_json::json!({ "trader": "ghost", "instrument": "XYZ", "quantity": 1 });
    let response = client
        .post(format!("http://{}/admin/grants", addr))
        .json(&missing)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
