use std::convert::Infallible;

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::ws::{Message, WebSocket, Ws};
use warp::{Filter, Reply};

use crate::api::UploadRequest;
use crate::error::Error;
use crate::metrics;
use crate::utils::{is_token_bonded, token_links, TokenLinks};
use crate::validation::validate_address;
use super::{error_reply, handle_rejection, with_state, AppState};

/// Logos arrive inline as data URLs.
const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
const MAX_JSON_BYTES: u64 = 64 * 1024;

type HandlerResult = Result<warp::reply::Response, Infallible>;

#[derive(Debug, Deserialize)]
pub struct PauseRequest {
    pub paused: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedStatus {
    pub paused: bool,
    pub connected: bool,
    pub subscribers: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct RewardsQuery {
    pub pool: Option<String>,
    pub token: Option<String>,
    pub creator: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WalletQuery {
    pub wallet: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionRequest {
    #[serde(default)]
    pub signed_transaction: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SendTransactionResponse {
    pub success: bool,
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BondedStatus {
    pub token_id: String,
    pub bonded: bool,
    pub links: TokenLinks,
}

/// All HTTP and WebSocket routes, with rejections rendered as JSON errors.
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health = warp::path!("health")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(health);

    let metrics_route = warp::path!("metrics").and(warp::get()).and_then(render_metrics);

    let feed_ws = warp::path!("api" / "feed" / "ws")
        .and(warp::ws())
        .and(with_state(state.clone()))
        .map(|ws: Ws, state: AppState| ws.on_upgrade(move |socket| feed_socket(socket, state)));

    let feed = warp::path!("api" / "feed")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(get_feed);

    let pause = warp::path!("api" / "feed" / "pause")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_JSON_BYTES))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(set_pause);

    let pool = warp::path!("api" / "pools" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(get_pool);

    let bonded = warp::path!("api" / "tokens" / String / "bonded")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(get_bonded);

    let rewards = warp::path!("api" / "rewards")
        .and(warp::get())
        .and(warp::query::<RewardsQuery>())
        .and(with_state(state.clone()))
        .and_then(get_rewards);

    let my_tokens = warp::path!("api" / "my-tokens")
        .and(warp::get())
        .and(warp::query::<WalletQuery>())
        .and(with_state(state.clone()))
        .and_then(get_my_tokens);

    let upload = warp::path!("api" / "upload")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_UPLOAD_BYTES))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(upload_metadata);

    let send_transaction = warp::path!("api" / "send-transaction")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_JSON_BYTES))
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(send_transaction);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"])
        .max_age(3600);

    health
        .or(metrics_route)
        .or(feed_ws)
        .or(feed)
        .or(pause)
        .or(pool)
        .or(bonded)
        .or(rewards)
        .or(my_tokens)
        .or(upload)
        .or(send_transaction)
        .with(cors)
        .with(warp::log("launchpad_service::web"))
        .recover(handle_rejection)
}

async fn health(state: AppState) -> HandlerResult {
    let snapshot = state.store.snapshot().await;
    Ok(warp::reply::json(&serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "streamConnected": state.store.is_connected(),
        "paused": state.store.is_paused(),
        "tokens": snapshot.len(),
    }))
    .into_response())
}

async fn render_metrics() -> HandlerResult {
    Ok(warp::reply::with_header(
        metrics::render(),
        "content-type",
        "text/plain; version=0.0.4",
    )
    .into_response())
}

async fn get_feed(state: AppState) -> HandlerResult {
    let snapshot = state.store.snapshot().await;
    Ok(warp::reply::json(&*snapshot).into_response())
}

/// Pushes every published snapshot to the socket until either side closes.
async fn feed_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = state.store.subscribe();
    info!("Feed client connected ({} subscribers)", state.store.subscriber_count());

    loop {
        tokio::select! {
            snapshot = subscription.recv() => {
                let Some(snapshot) = snapshot else { break };
                let text = match serde_json::to_string(&*snapshot) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Failed to serialize feed snapshot: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sender.send(Message::text(text)).await {
                    debug!("Feed client send failed: {}", e);
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(msg)) if msg.is_close() => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Feed client receive failed: {}", e);
                    break;
                }
                None => break,
            },
        }
    }

    info!("Feed client disconnected");
}

async fn set_pause(request: PauseRequest, state: AppState) -> HandlerResult {
    state.store.set_paused(request.paused).await;
    info!("Feed {}", if request.paused { "paused" } else { "resumed" });
    Ok(warp::reply::json(&FeedStatus {
        paused: state.store.is_paused(),
        connected: state.store.is_connected(),
        subscribers: state.store.subscriber_count(),
    })
    .into_response())
}

async fn get_pool(token_id: String, state: AppState) -> HandlerResult {
    match state.pools.fetch_pool_data(&token_id).await {
        Some(pool) => Ok(warp::reply::json(&pool).into_response()),
        None => Ok(error_reply(StatusCode::NOT_FOUND, "Pool not found")),
    }
}

async fn get_bonded(token_id: String, state: AppState) -> HandlerResult {
    let pool = state.pools.fetch_pool_data(&token_id).await;
    let snapshot = state.store.snapshot().await;
    let bonded = is_token_bonded(pool.as_ref(), Some(&snapshot), &token_id);
    let links = token_links(&token_id, pool.as_ref().map(|p| p.id.as_str()), bonded);
    Ok(warp::reply::json(&BondedStatus { token_id, bonded, links }).into_response())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn get_rewards(query: RewardsQuery, state: AppState) -> HandlerResult {
    let (Some(pool), Some(creator)) = (non_empty(query.pool), non_empty(query.creator)) else {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "pool and creator are required"));
    };
    let token = non_empty(query.token);
    for address in [Some(&pool), Some(&creator), token.as_ref()].into_iter().flatten() {
        if let Err(e) = validate_address(address) {
            return Ok(error_reply(StatusCode::BAD_REQUEST, e.to_string()));
        }
    }

    let rewards = state.rewards.fetch_rewards(&pool, token.as_deref(), &creator).await;
    Ok(warp::reply::json(&rewards).into_response())
}

async fn get_my_tokens(query: WalletQuery, state: AppState) -> HandlerResult {
    let Some(wallet) = non_empty(query.wallet) else {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "Wallet address is required"));
    };
    let Some(tokens) = state.tokens.as_ref() else {
        error!("Database not configured, cannot list tokens for {}", wallet);
        return Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch tokens"));
    };

    match tokens.my_tokens(&wallet).await {
        Ok(tokens) => Ok(warp::reply::json(&tokens).into_response()),
        Err(e) => {
            metrics::API_ERRORS.inc();
            error!("Database error: {}", e);
            Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch tokens"))
        }
    }
}

async fn upload_metadata(request: UploadRequest, state: AppState) -> HandlerResult {
    if let Err(e) = request.validate() {
        return Ok(error_reply(StatusCode::BAD_REQUEST, e.to_string()));
    }
    let Some(uploader) = state.uploader.as_ref() else {
        return Ok(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            Error::ConfigError("Pinata credentials are not configured".to_string()).to_string(),
        ));
    };

    match uploader.upload_token_metadata(&request).await {
        Ok(response) => Ok(warp::reply::json(&response).into_response()),
        Err(e) => {
            metrics::API_ERRORS.inc();
            error!("Upload error: {}", e);
            Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn send_transaction(request: SendTransactionRequest, state: AppState) -> HandlerResult {
    let Some(signed) = non_empty(request.signed_transaction) else {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "Missing signed transaction"));
    };
    let Some(transactions) = state.transactions.as_ref() else {
        error!("RPC URL not configured, cannot forward transaction");
        return Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, "RPC URL not configured"));
    };

    match transactions.send_and_confirm(&signed, state.confirm_timeout).await {
        Ok(signature) => Ok(warp::reply::json(&SendTransactionResponse {
            success: true,
            signature,
        })
        .into_response()),
        Err(e) => {
            metrics::API_ERRORS.inc();
            warn!("Transaction error: {}", e);
            Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
