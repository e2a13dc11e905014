use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use lazy_static::lazy_static;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref FEED_EVENTS: IntCounter = IntCounter::new(
        "feed_events_applied_total",
        "Total number of stream events applied to the feed"
    ).expect("metric can be created");

    pub static ref FEED_MESSAGES_DROPPED: IntCounter = IntCounter::new(
        "feed_messages_dropped_total",
        "Stream messages or events that could not be decoded"
    ).expect("metric can be created");

    pub static ref STREAM_CONNECTED: IntGauge = IntGauge::new(
        "feed_stream_connected",
        "1 while the vendor stream is connected"
    ).expect("metric can be created");

    pub static ref API_ERRORS: IntCounter = IntCounter::new(
        "api_errors_total",
        "Upstream API, RPC and database failures"
    ).expect("metric can be created");
}

pub fn init() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(FEED_EVENTS.clone()))?;
    REGISTRY.register(Box::new(FEED_MESSAGES_DROPPED.clone()))?;
    REGISTRY.register(Box::new(STREAM_CONNECTED.clone()))?;
    REGISTRY.register(Box::new(API_ERRORS.clone()))?;
    Ok(())
}

/// Renders the registry in the Prometheus text exposition format.
pub fn render() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        log::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
