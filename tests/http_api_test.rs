use serde_json::Value;
use std::sync::Arc;

use waypoint_resolver::config::ResolverConfig;
use waypoint_resolver::destination::DestinationResolver;
use waypoint_resolver::server::build_router;

/// Serve the router on an ephemeral port and return its base URL.
async fn spawn_server() -> String {
    let resolver = Arc::new(DestinationResolver::from_config(&ResolverConfig::default().offline()).unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(resolver)).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Blocking GET off the runtime; returns status and parsed body.
async fn get(url: String) -> (u16, Value) {
    tokio::task::spawn_blocking(move || match ureq::get(&url).call() {
        Ok(resp) => (resp.status(), resp.into_json::<Value>().unwrap()),
        Err(ureq::Error::Status(code, resp)) => (code, resp.into_json::<Value>().unwrap()),
        Err(e) => panic!("request failed: {}", e),
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_resolve_endpoint() {
    let base = spawn_server().await;
    let (status, body) = get(format!("{}/api/resolve?query=french%20riviera", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["resolved"], true);
    assert_eq!(body["resolution_layer"], 3);
    assert_eq!(body["primary"]["destination_code"], "NCE");
    assert_eq!(body["alternatives"].as_array().unwrap().len(), 4);
    assert_eq!(body["needs_confirmation"], false);
}

#[tokio::test]
async fn test_resolve_requires_query() {
    let base = spawn_server().await;
    let (status, body) = get(format!("{}/api/resolve?query=%20", base)).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], 400);

    let (status, _) = get(format!("{}/api/resolve?query=nice&lat=43.7", base)).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_suggest_endpoint() {
    let base = spawn_server().await;
    let (status, body) = get(format!("{}/api/suggest?prefix=san&limit=2", base)).await;
    assert_eq!(status, 200);
    let codes: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, vec!["SFO", "SAN"]);

    let (status, _) = get(format!("{}/api/suggest", base)).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_destinations_listing() {
    let base = spawn_server().await;
    let (status, body) = get(format!("{}/api/destinations", base)).await;
    assert_eq!(status, 200);
    let list = body.as_array().unwrap();
    assert!(list.iter().any(|d| d["code"] == "JFK" && d["kind"] == "airport"));
    assert!(list.iter().any(|d| d["code"] == "NYC" && d["kind"] == "city"));
}
