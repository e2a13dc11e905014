pub mod api;
pub mod server;

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::api::{MetadataUploader, PoolSource};
use crate::db::TokenStore;
use crate::feed::FeedStore;
use crate::rewards::RewardAggregator;
use crate::solana::TransactionSubmitter;

pub use api::routes;
pub use server::WebServer;

/// Everything the route handlers share. Optional backends are absent when
/// their credentials were not configured; the routes then answer 500.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FeedStore>,
    pub pools: Arc<dyn PoolSource>,
    pub rewards: RewardAggregator,
    pub tokens: Option<Arc<dyn TokenStore>>,
    pub uploader: Option<Arc<dyn MetadataUploader>>,
    pub transactions: Option<Arc<dyn TransactionSubmitter>>,
    pub confirm_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<FeedStore>, pools: Arc<dyn PoolSource>, rewards: RewardAggregator) -> Self {
        Self {
            store,
            pools,
            rewards,
            tokens: None,
            uploader: None,
            transactions: None,
            confirm_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_tokens(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn MetadataUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn with_transactions(mut self, transactions: Arc<dyn TransactionSubmitter>, timeout: Duration) -> Self {
        self.transactions = Some(transactions);
        self.confirm_timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn error_reply(status: StatusCode, message: impl Into<String>) -> warp::reply::Response {
    let body = ErrorBody { error: message.into() };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

pub(crate) fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Renders warp's own rejections in the same `{"error": ...}` shape as the handlers.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, format!("Invalid query: {}", e))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };
    Ok(error_reply(status, message))
}
