use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

/// Header name for trace ID.
pub const TRACE_ID_HEADER: &str = "x-trace-id";
/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request tracing state.
#[derive(Debug, Clone)]
pub struct TracingState {
    /// Trace ID, propagated from the caller when present.
    pub trace_id: String,
    /// Unique request ID.
    pub request_id: String,
    pub start_time: std::time::Instant,
}

impl TracingState {
    pub fn new() -> Self {
        Self::with_trace_id(Uuid::new_v4().to_string())
    }

    /// Create with an existing trace ID (for propagation).
    pub fn with_trace_id(trace_id: String) -> Self {
        Self {
            trace_id,
            request_id: Uuid::new_v4().to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Get elapsed time since request start.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for TracingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Attach a [`TracingState`] to the request and echo its ids on the response.
pub async fn tracing_middleware(mut req: Request, next: Next) -> Response {
    let state = req
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| TracingState::with_trace_id(v.to_string()))
        .unwrap_or_default();

    req.extensions_mut().insert(state.clone());

    let span = tracing::info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        trace_id = %state.trace_id,
        request_id = %state.request_id,
    );
    let mut response = next.run(req).instrument(span).await;

    tracing::debug!(
        trace_id = %state.trace_id,
        status = response.status().as_u16(),
        elapsed_ms = state.elapsed().as_millis() as u64,
        "Request finished"
    );

    if let Ok(val) = HeaderValue::from_str(&state.trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, val);
    }
    if let Ok(val) = HeaderValue::from_str(&state.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_state_new() {
        let state = TracingState::new();
        assert!(!state.trace_id.is_empty());
        assert!(!state.request_id.is_empty());
        assert_ne!(state.trace_id, state.request_id);
    }

    #[test]
    fn test_tracing_state_with_trace_id() {
        let state = TracingState::with_trace_id("trace-123".to_string());
        assert_eq!(state.trace_id, "trace-123");
        assert!(!state.request_id.is_empty());
    }

    #[test]
    fn test_tracing_state_elapsed() {
        let state = TracingState::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(state.elapsed().as_millis() >= 10);
    }
}
