mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{make_pool, test_state, FakePools, FakeSubmitter, FakeUploader};
use launchpad_service::solana::RpcClient;
use launchpad_service::web::routes;
use serde_json::{json, Value};

fn body(res: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

fn upload_body() -> Value {
    json!({
        "tokenLogo": "data:image/png;base64,aGVsbG8=",
        "tokenName": "Fairly",
        "tokenSymbol": "FAIR",
        "description": "A fair launch",
        "mint": "MintFair",
        "website": "https://fairly.best"
    })
}

#[tokio::test]
async fn test_pool_lookup() {
    let pools = FakePools::default().with("mint1", make_pool("pool1", "mint1", "2025-06-01T10:00:00Z", 42.0));
    let filter = routes(test_state(pools));

    let res = warp::test::request().path("/api/pools/mint1").reply(&filter).await;
    assert_eq!(res.status(), 200);
    let pool = body(&res);
    assert_eq!(pool["id"], "pool1");
    assert_eq!(pool["bondingCurve"], 42.0);
    assert_eq!(pool["baseAsset"]["id"], "mint1");

    let res = warp::test::request().path("/api/pools/mint2").reply(&filter).await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_bonded_check_for_curve_in_progress() {
    let pools = FakePools::default().with("mint1", make_pool("pool1", "mint1", "2025-06-01T10:00:00Z", 42.0));
    let res = warp::test::request()
        .path("/api/tokens/mint1/bonded")
        .reply(&routes(test_state(pools)))
        .await;
    let status = body(&res);
    assert_eq!(status["bonded"], false);
    assert_eq!(status["links"]["dexscreener"], "https://dexscreener.com/solana/mint1");
    assert_eq!(status["links"]["solscan"], "https://solscan.io/token/mint1");
}

#[tokio::test]
async fn test_upload_pins_metadata() {
    let uploader = Arc::new(FakeUploader::default());
    let state = test_state(FakePools::default()).with_uploader(uploader.clone());

    let res = warp::test::request()
        .method("POST")
        .path("/api/upload")
        .json(&upload_body())
        .reply(&routes(state))
        .await;
    assert_eq!(res.status(), 200);
    assert_eq!(
        body(&res),
        json!({
            "success": true,
            "imageUrl": "https://ipfs.io/ipfs/logo-MintFair",
            "metadataUrl": "https://ipfs.io/ipfs/meta-MintFair"
        })
    );
    assert_eq!(uploader.received.lock().unwrap()[0].token_symbol, "FAIR");
}

#[tokio::test]
async fn test_upload_failure_is_500() {
    let uploader = Arc::new(FakeUploader {
        fail: true,
        ..FakeUploader::default()
    });
    let state = test_state(FakePools::default()).with_uploader(uploader);

    let res = warp::test::request()
        .method("POST")
        .path("/api/upload")
        .json(&upload_body())
        .reply(&routes(state))
        .await;
    assert_eq!(res.status(), 500);
    assert!(body(&res)["error"].as_str().unwrap().contains("Pinata"));
}

#[tokio::test]
async fn test_upload_missing_mint_is_400() {
    let uploader = Arc::new(FakeUploader::default());
    let state = test_state(FakePools::default()).with_uploader(uploader.clone());
    let mut request = upload_body();
    request["mint"] = json!("");

    let res = warp::test::request()
        .method("POST")
        .path("/api/upload")
        .json(&request)
        .reply(&routes(state))
        .await;
    assert_eq!(res.status(), 400);
    assert!(uploader.received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_transaction_success() {
    let submitter = Arc::new(FakeSubmitter {
        outcome: Ok("5igSig".to_string()),
    });
    let state = test_state(FakePools::default()).with_transactions(submitter, Duration::from_secs(5));

    let res = warp::test::request()
        .method("POST")
        .path("/api/send-transaction")
        .json(&json!({"signedTransaction": "AQID"}))
        .reply(&routes(state))
        .await;
    assert_eq!(res.status(), 200);
    assert_eq!(body(&res), json!({"success": true, "signature": "5igSig"}));
}

#[tokio::test]
async fn test_send_transaction_failure() {
    let submitter = Arc::new(FakeSubmitter {
        outcome: Err("blockhash not found".to_string()),
    });
    let state = test_state(FakePools::default()).with_transactions(submitter, Duration::from_secs(5));

    let res = warp::test::request()
        .method("POST")
        .path("/api/send-transaction")
        .json(&json!({"signedTransaction": "AQID"}))
        .reply(&routes(state))
        .await;
    assert_eq!(res.status(), 500);
    assert!(body(&res)["error"].as_str().unwrap().contains("blockhash not found"));
}

#[tokio::test]
async fn test_send_transaction_bad_encoding_is_server_error() {
    // Decoding fails before any request reaches the node.
    let rpc = Arc::new(RpcClient::new("http://127.0.0.1:9".to_string()));
    let state = test_state(FakePools::default()).with_transactions(rpc, Duration::from_secs(1));
    let res = warp::test::request()
        .method("POST")
        .path("/api/send-transaction")
        .json(&json!({"signedTransaction": "not base64!"}))
        .reply(&routes(state))
        .await;
    assert_eq!(res.status(), 500);
    assert!(body(&res)["error"].as_str().unwrap().starts_with("Parse error"));
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let res = warp::test::request()
        .method("POST")
        .path("/api/feed/pause")
        .header("content-type", "application/json")
        .body("{\"paused\": ")
        .reply(&routes(test_state(FakePools::default())))
        .await;
    assert_eq!(res.status(), 400);
    assert!(body(&res)["error"].is_string());
}

#[tokio::test]
async fn test_metrics_exposed() {
    let res = warp::test::request()
        .path("/metrics")
        .reply(&routes(test_state(FakePools::default())))
        .await;
    assert_eq!(res.status(), 200);
}
