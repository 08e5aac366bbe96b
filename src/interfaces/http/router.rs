//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{
    BookingService, BookingView, CheckInVerifier, RefundAuditEntry, RefundAuditOutcome,
    RefundGateway, RefundReceipt,
};
use crate::domain::{
    ActorRole, BookingSource, BookingStatus, BookingTransition, ErrorKind, RefundPolicy,
    RefundStatus, RefundType, ResourceKind, ScanResult, TransitionRecord,
};
use crate::interfaces::http::common::{ApiResponse, PaginatedResponse};

use super::modules::{bookings, checkin, health, metrics, refunds};

/// Everything the HTTP layer needs. Handlers extract their own slice of it
/// through `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub bookings: Arc<BookingService>,
    pub checkin: Arc<CheckInVerifier>,
    pub refunds: Arc<RefundGateway>,
    /// `None` when running on the in-memory store
    pub db: Option<DatabaseConnection>,
    pub storage: &'static str,
    pub started_at: Arc<Instant>,
}

impl FromRef<ApiState> for bookings::BookingAppState {
    fn from_ref(s: &ApiState) -> Self {
        bookings::BookingAppState {
            bookings: Arc::clone(&s.bookings),
            refunds: Arc::clone(&s.refunds),
        }
    }
}

impl FromRef<ApiState> for checkin::CheckInAppState {
    fn from_ref(s: &ApiState) -> Self {
        checkin::CheckInAppState {
            verifier: Arc::clone(&s.checkin),
        }
    }
}

impl FromRef<ApiState> for refunds::RefundAppState {
    fn from_ref(s: &ApiState) -> Self {
        refunds::RefundAppState {
            refunds: Arc::clone(&s.refunds),
        }
    }
}

impl FromRef<ApiState> for health::HealthState {
    fn from_ref(s: &ApiState) -> Self {
        health::HealthState {
            db: s.db.clone(),
            storage: s.storage,
            checkin: Arc::clone(&s.checkin),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Bookings
        bookings::list_bookings,
        bookings::get_booking,
        bookings::create_booking,
        bookings::transition_booking,
        bookings::get_checkin_token,
        // Refunds
        bookings::request_refund,
        refunds::refund_audit,
        // Check-in
        checkin::scan_token,
        checkin::recent_scans,
        checkin::end_scan_session,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            PaginatedResponse<BookingView>,
            ErrorKind,
            ActorRole,
            // Bookings
            BookingView,
            BookingStatus,
            BookingSource,
            BookingTransition,
            ResourceKind,
            TransitionRecord,
            bookings::CreateBookingRequest,
            bookings::TransitionRequest,
            bookings::TransitionResponse,
            bookings::CheckInTokenResponse,
            // Refunds
            RefundPolicy,
            RefundType,
            RefundStatus,
            RefundReceipt,
            RefundAuditEntry,
            RefundAuditOutcome,
            bookings::RefundKind,
            bookings::RefundHttpRequest,
            // Check-in
            ScanResult,
            checkin::CheckInRequest,
            // Health
            health::HealthResponse,
            health::ComponentHealth,
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Bookings", description = "Booking registration, lookup and lifecycle transitions"),
        (name = "Refunds", description = "Policy-evaluated refunds and their audit trail"),
        (name = "Check-in", description = "QR token issuing and scanning at the event door"),
    ),
    info(
        title = "Hotel Booking Lifecycle API",
        version = "1.0.0",
        description = "Booking lifecycle, refund policy evaluation and event check-in",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes.
///
/// `/metrics` is only mounted when a Prometheus handle is supplied.
pub fn create_api_router(state: ApiState, prometheus: Option<PrometheusHandle>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Bookings
        .route(
            "/api/v1/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/api/v1/bookings/{id}", get(bookings::get_booking))
        .route(
            "/api/v1/bookings/{id}/transition",
            post(bookings::transition_booking),
        )
        .route("/api/v1/bookings/{id}/refund", post(bookings::request_refund))
        .route(
            "/api/v1/bookings/{id}/checkin-token",
            get(bookings::get_checkin_token),
        )
        // Check-in
        .route("/api/v1/checkin", post(checkin::scan_token))
        .route("/api/v1/checkin/scans", get(checkin::recent_scans))
        .route(
            "/api/v1/checkin/sessions/{session_id}",
            delete(checkin::end_scan_session),
        )
        // Refund audit
        .route("/api/v1/refunds/audit", get(refunds::refund_audit))
        .route_layer(middleware::from_fn(metrics::http_metrics_middleware))
        .with_state(state);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    let mut router = Router::new().merge(swagger_routes).merge(api_routes);

    if let Some(handle) = prometheus {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics::prometheus_metrics))
                .with_state(metrics::MetricsState { handle }),
        );
    }

    router.layer(cors).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::application::{create_event_bus, RefundGatewayConfig};
    use crate::infrastructure::InMemoryBookingRepository;

    fn app() -> Router {
        let bookings = Arc::new(BookingService::new(
            Arc::new(InMemoryBookingRepository::new()),
            create_event_bus(),
        ));
        let state = ApiState {
            checkin: Arc::new(CheckInVerifier::new(bookings.clone(), 50)),
            refunds: Arc::new(RefundGateway::new(
                bookings.clone(),
                RefundGatewayConfig::default(),
            )),
            bookings,
            db: None,
            storage: "memory",
            started_at: Arc::new(Instant::now()),
        };
        create_api_router(state, None)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn event_booking(id: &str, starts_in_days: i64) -> Value {
        json!({
            "id": id,
            "resource_id": "e1",
            "resource_kind": "Event",
            "guest_name": "John Smith",
            "attendee_or_guest_count": 2,
            "total_amount": "150.00",
            "scheduled_start": Utc::now() + Duration::days(starts_in_days),
            "source": "Website",
            "refund_policy": {
                "kind": "standard",
                "is_refundable": true,
                "window_days": 2,
                "refund_percentage": "100"
            }
        })
    }

    #[tokio::test]
    async fn health_reports_memory_backend() {
        let app = app();
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"]["backend"], "memory");
    }

    #[tokio::test]
    async fn create_then_get_hides_source_from_staff() {
        let app = app();
        let (status, body) = call(&app, "POST", "/api/v1/bookings", Some(event_booking("b1", 3))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "Confirmed");

        let (status, staff) = call(&app, "GET", "/api/v1/bookings/b1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(staff["data"].get("source").is_none());

        let (_, admin) = call(&app, "GET", "/api/v1/bookings/b1?actor_role=super_admin", None).await;
        assert_eq!(admin["data"]["source"], "Website");

        let (status, missing) = call(&app, "GET", "/api/v1/bookings/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(missing["code"], "NotFound");
    }

    #[tokio::test]
    async fn duplicate_booking_id_conflicts() {
        let app = app();
        call(&app, "POST", "/api/v1/bookings", Some(event_booking("b1", 3))).await;
        let (status, body) = call(&app, "POST", "/api/v1/bookings", Some(event_booking("b1", 3))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "Conflict");
    }

    #[tokio::test]
    async fn invalid_booking_body_is_rejected() {
        let app = app();
        let mut body = event_booking("b1", 3);
        body["guest_name"] = json!("");
        let (status, response) = call(&app, "POST", "/api/v1/bookings", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response["success"], false);
    }

    #[tokio::test]
    async fn scan_check_in_and_replay() {
        let app = app();
        call(&app, "POST", "/api/v1/bookings", Some(event_booking("b1", 3))).await;

        let (status, token) =
            call(&app, "GET", "/api/v1/bookings/b1/checkin-token?event_title=Summer%20Jazz", None).await;
        assert_eq!(status, StatusCode::OK);
        let token = token["data"]["token"].as_str().unwrap().to_string();
        assert_eq!(token, "HOTEL_EVENT:e1:b1:John Smith:Summer Jazz");

        let scan = json!({ "token": token, "actor_role": "staff" });
        let (status, first) = call(&app, "POST", "/api/v1/checkin", Some(scan.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["data"]["success"], true);

        let (status, replay) = call(&app, "POST", "/api/v1/checkin", Some(scan)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(replay["data"]["success"], false);
        assert_eq!(replay["data"]["duplicate"], true);

        let (_, booking) = call(&app, "GET", "/api/v1/bookings/b1", None).await;
        assert_eq!(booking["data"]["status"], "Attended");

        let (_, scans) = call(&app, "GET", "/api/v1/checkin/scans?limit=5", None).await;
        assert_eq!(scans["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn malformed_token_is_a_failed_scan() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/checkin",
            Some(json!({ "token": "garbage", "session_id": "door-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["success"], false);
        assert_eq!(body["data"]["error_kind"], "MalformedInput");

        // the session was released once its scan finished
        let (_, health) = call(&app, "GET", "/health", None).await;
        assert_eq!(health["active_scan_sessions"], 0);
        let (_, ended) = call(&app, "DELETE", "/api/v1/checkin/sessions/door-1", None).await;
        assert_eq!(ended["data"], false);
    }

    #[tokio::test]
    async fn source_filter_is_ignored_for_staff() {
        let app = app();
        call(&app, "POST", "/api/v1/bookings", Some(event_booking("w1", 3))).await;
        let mut from_app = event_booking("a1", 4);
        from_app["source"] = json!("App");
        call(&app, "POST", "/api/v1/bookings", Some(from_app)).await;

        let ids = |body: &Value| {
            let mut ids: Vec<String> = body["data"]["items"]
                .as_array()
                .unwrap()
                .iter()
                .map(|b| b["id"].as_str().unwrap().to_string())
                .collect();
            ids.sort();
            ids
        };

        for source in ["Website", "App"] {
            let uri = format!("/api/v1/bookings?source={source}&actor_role=staff");
            let (status, body) = call(&app, "GET", &uri, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(ids(&body), ["a1", "w1"]);
        }

        let (_, body) = call(&app, "GET", "/api/v1/bookings?source=App&actor_role=super_admin", None).await;
        assert_eq!(ids(&body), ["a1"]);
    }

    #[tokio::test]
    async fn malformed_refund_body_is_audited() {
        let app = app();
        call(&app, "POST", "/api/v1/bookings", Some(event_booking("b1", 10))).await;

        let partial = json!({ "type": "Partial", "reason": "x", "actor_role": "super_admin" });
        let (status, body) = call(&app, "POST", "/api/v1/bookings/b1/refund", Some(partial)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MalformedInput");

        let (_, audit) = call(&app, "GET", "/api/v1/refunds/audit?actor_role=super_admin", None).await;
        let entries = audit["data"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["outcome"], "rejected");
        assert_eq!(entries[0]["error_kind"], "MalformedInput");
        assert!(entries[0]["request"].is_null());
    }

    #[tokio::test]
    async fn illegal_transition_is_409() {
        let app = app();
        call(&app, "POST", "/api/v1/bookings", Some(event_booking("b1", 3))).await;

        let cancel = json!({ "event": "Cancel", "actor_role": "staff" });
        let (status, body) = call(&app, "POST", "/api/v1/bookings/b1/transition", Some(cancel)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["booking"]["status"], "Cancelled");
        assert_eq!(body["data"]["outcome"], "applied");

        let check_in = json!({ "event": "CheckIn", "actor_role": "staff" });
        let (status, body) = call(&app, "POST", "/api/v1/bookings/b1/transition", Some(check_in)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "IllegalTransition");

        let restore = json!({ "event": "Restore", "actor_role": "staff" });
        let (status, _) = call(&app, "POST", "/api/v1/bookings/b1/transition", Some(restore)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn refund_requires_elevated_role_and_policy() {
        let app = app();
        call(&app, "POST", "/api/v1/bookings", Some(event_booking("soon", 3))).await;
        call(&app, "POST", "/api/v1/bookings", Some(event_booking("past", -1))).await;

        let full = |role: &str| json!({ "type": "Full", "reason": "guest request", "actor_role": role });

        let (status, body) = call(&app, "POST", "/api/v1/bookings/soon/refund", Some(full("staff"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "Unauthorized");

        let (status, body) =
            call(&app, "POST", "/api/v1/bookings/past/refund", Some(full("super_admin"))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "PolicyIneligible");

        let (status, body) =
            call(&app, "POST", "/api/v1/bookings/soon/refund", Some(full("super_admin"))).await;
        assert_eq!(status, StatusCode::OK);
        let amount: rust_decimal::Decimal =
            body["data"]["computed_amount"].as_str().unwrap().parse().unwrap();
        assert_eq!(amount, rust_decimal::Decimal::from(150));

        let (status, _) = call(&app, "GET", "/api/v1/refunds/audit", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, audit) =
            call(&app, "GET", "/api/v1/refunds/audit?actor_role=super_admin", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(audit["data"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = app();
        let (status, doc) = call(&app, "GET", "/api-doc/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"].get("/api/v1/checkin").is_some());
    }
}
