//! The JSON API served over a real socket, backed by a stub geocoder.

use massgeo::geocode::{AddressResolver, ResolverConfig};
use massgeo::server::build_router;
use serde_json::{json, Value};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(geocoder: &MockServer) -> String {
    let config = ResolverConfig {
        endpoint: format!("{}/findAddressCandidates", geocoder.uri()),
        timeout_secs: 5,
        ..Default::default()
    };
    let app = build_router(AddressResolver::new(config).unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn get(url: String) -> (u16, Value) {
    tokio::task::spawn_blocking(move || match ureq::get(&url).call() {
        Ok(resp) => (resp.status(), resp.into_json::<Value>().unwrap()),
        Err(ureq::Error::Status(code, resp)) => (code, resp.into_json::<Value>().unwrap()),
        Err(e) => panic!("request to {} failed: {}", url, e),
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_resolve_with_warning() {
    let geocoder = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"location": {"x": 236000, "y": 899000}, "score": 82}]
        })))
        .mount(&geocoder)
        .await;
    let base = serve(&geocoder).await;

    let (status, body) = get(format!(
        "{}/api/resolve?street=1%20Beacon%20St&city=Boston&zip=02108",
        base
    ))
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["outcome"], "resolved");
    assert_eq!(body["warning"]["kind"], "low_confidence");
    let lat = body["location"]["latitude"].as_f64().unwrap();
    assert!((lat - 42.34066).abs() < 1e-4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_street_is_bad_request() {
    let geocoder = MockServer::start().await;
    let base = serve(&geocoder).await;

    let (status, body) = get(format!("{}/api/resolve?city=Boston", base)).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], 400);
    assert!(geocoder.received_requests().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upstream_failure_is_bad_gateway() {
    let geocoder = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&geocoder)
        .await;
    let base = serve(&geocoder).await;

    let (status, body) = get(format!("{}/api/resolve?street=1+Beacon+St", base)).await;
    assert_eq!(status, 502);
    assert_eq!(body["outcome"], "transport_failure");
    assert_eq!(body["status"], 503);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_config_endpoint() {
    let geocoder = MockServer::start().await;
    let base = serve(&geocoder).await;

    let (status, body) = get(format!("{}/api/config", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["policy"]["reject_below"], 75.0);
    assert!(body["source_crs"].as_str().unwrap().contains("+proj=lcc"));
}
