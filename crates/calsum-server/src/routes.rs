//! HTTP routes and request-scoped error mapping.
//!
//! Two routes: a liveness greeting and the calendar summary. Every
//! provider failure is mapped to an HTTP error response here; nothing a
//! request does can take the process down.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tracing::{debug, error};

use calsum_providers::{ProviderError, ProviderErrorCode, SummaryProvider};

/// Shared state: the summary provider behind the `/calendar` route.
#[derive(Clone)]
pub struct AppState {
    /// Startup-authorized summary provider.
    pub provider: Arc<dyn SummaryProvider>,
}

impl AppState {
    /// Creates app state around a provider.
    pub fn new(provider: Arc<dyn SummaryProvider>) -> Self {
        Self { provider }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(say_hello))
        .route("/calendar", get(calendar_summary))
        .with_state(state)
}

/// `GET /` - liveness greeting.
async fn say_hello() -> &'static str {
    "Hello!"
}

/// `GET /calendar` - the full summary chain, one JSON array per request.
async fn calendar_summary(State(state): State<AppState>) -> Result<Response, AppError> {
    debug!(provider = state.provider.name(), "building calendar summary");
    let summary = state.provider.fetch_summary().await?;

    // Json would emit plain application/json; keep the charset parameter
    // the endpoint has always advertised.
    let response = (
        [(header::CONTENT_TYPE, "application/json; charset=UTF-8")],
        Json(summary),
    )
        .into_response();
    Ok(response)
}

/// A provider error carried to the HTTP layer.
#[derive(Debug)]
pub struct AppError(ProviderError);

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.code() {
            ProviderErrorCode::ConfigurationError | ProviderErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProviderErrorCode::RateLimited => StatusCode::SERVICE_UNAVAILABLE,
            ProviderErrorCode::AuthenticationFailed
            | ProviderErrorCode::AuthorizationFailed
            | ProviderErrorCode::NetworkError
            | ProviderErrorCode::ServerError
            | ProviderErrorCode::InvalidResponse => StatusCode::BAD_GATEWAY,
        };

        error!(
            code = %self.0.code(),
            status = %status,
            error = %self.0,
            "calendar summary request failed"
        );

        let body = Json(json!({
            "error": self.0.message(),
            "code": self.0.code().as_str(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use calsum_providers::{BoxFuture, ProviderResult, SummaryEvent};

    /// Provider returning a fixed summary.
    struct StaticProvider(Vec<SummaryEvent>);

    impl SummaryProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        fn fetch_summary(&self) -> BoxFuture<'_, ProviderResult<Vec<SummaryEvent>>> {
            let events = self.0.clone();
            Box::pin(async move { Ok(events) })
        }
    }

    /// Provider that fails its first call, then recovers.
    struct FlakyProvider {
        failed_once: AtomicBool,
    }

    impl SummaryProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fetch_summary(&self) -> BoxFuture<'_, ProviderResult<Vec<SummaryEvent>>> {
            Box::pin(async move {
                if self.failed_once.swap(true, Ordering::SeqCst) {
                    Ok(Vec::new())
                } else {
                    Err(ProviderError::invalid_response(
                        "unparseable start timestamp",
                    ))
                }
            })
        }
    }

    fn sample_events() -> Vec<SummaryEvent> {
        vec![
            SummaryEvent {
                calendar: "Work".to_string(),
                summary: "E1".to_string(),
                created: "2024-03-01T08:00:00Z".to_string(),
                recurring_event: false,
                event_time: 30.0,
            },
            SummaryEvent {
                calendar: "Home".to_string(),
                summary: "E2".to_string(),
                created: "2024-03-02T08:00:00Z".to_string(),
                recurring_event: true,
                event_time: 15.0,
            },
        ]
    }

    fn app(provider: impl SummaryProvider + 'static) -> Router {
        router(AppState::new(Arc::new(provider)))
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn hello_route() {
        let app = app(StaticProvider(Vec::new()));

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"Hello!");
    }

    #[tokio::test]
    async fn hello_route_ignores_query_and_headers() {
        let app = app(StaticProvider(Vec::new()));

        let response = app
            .oneshot(
                Request::get("/?probe=1")
                    .header("X-Anything", "yes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"Hello!");
    }

    #[tokio::test]
    async fn calendar_route_returns_summary_in_order() {
        let app = app(StaticProvider(sample_events()));

        let response = app
            .oneshot(Request::get("/calendar").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(content_type, "application/json; charset=UTF-8");

        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        let array = body.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["calendar"], "Work");
        assert_eq!(array[0]["eventTime"], 30.0);
        assert_eq!(array[1]["calendar"], "Home");
        assert_eq!(array[1]["eventTime"], 15.0);
        assert_eq!(array[1]["recurringEvent"], true);
    }

    #[tokio::test]
    async fn calendar_route_empty_summary_is_empty_array() {
        let app = app(StaticProvider(Vec::new()));

        let response = app
            .oneshot(Request::get("/calendar").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"[]");
    }

    #[tokio::test]
    async fn provider_failure_is_request_scoped() {
        let app = app(FlakyProvider {
            failed_once: AtomicBool::new(false),
        });

        // First request hits the failure and gets an error status.
        let response = app
            .clone()
            .oneshot(Request::get("/calendar").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["code"], "invalid_response");

        // The router keeps serving: the next request succeeds.
        let response = app
            .oneshot(Request::get("/calendar").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn configuration_error_maps_to_internal_error() {
        struct BrokenProvider;

        impl SummaryProvider for BrokenProvider {
            fn name(&self) -> &str {
                "broken"
            }

            fn fetch_summary(&self) -> BoxFuture<'_, ProviderResult<Vec<SummaryEvent>>> {
                Box::pin(async { Err(ProviderError::configuration("missing credentials")) })
            }
        }

        let response = app(BrokenProvider)
            .oneshot(Request::get("/calendar").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn non_get_methods_are_rejected() {
        let app = app(StaticProvider(Vec::new()));

        let response = app
            .clone()
            .oneshot(Request::post("/calendar").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = app
            .oneshot(Request::delete("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
