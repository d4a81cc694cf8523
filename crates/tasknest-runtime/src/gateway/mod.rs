mod auth;
mod extract;
mod response;
mod routes;
mod server;
mod tracing;

pub use auth::{AuthError, AuthMiddleware, JwtAlgorithm};
pub use extract::{ApiJson, ApiPath, ApiQuery, Caller};
pub use response::{created, ApiError, ApiResult};
pub use server::{AppState, GatewayServer, HealthResponse};
pub use tracing::{TracingState, REQUEST_ID_HEADER, TRACE_ID_HEADER};
