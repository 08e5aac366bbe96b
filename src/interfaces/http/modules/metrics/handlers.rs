//! Prometheus scrape endpoint
//!
//! Renders whatever the global `metrics-exporter-prometheus` recorder holds,
//! including the booking, check-in and refund counters recorded by the services.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// Registers help text for the counters the application records.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "booking_transitions_total",
        "Lifecycle transitions by transition and outcome"
    );
    metrics::describe_counter!("checkin_scans_total", "Check-in scans by result");
    metrics::describe_counter!("refund_requests_total", "Refund requests by result");
    metrics::describe_counter!("http_requests_total", "HTTP requests by method, path and status");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        metrics::Unit::Seconds,
        "HTTP request latency"
    );
}

/// `GET /metrics`
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    #[tokio::test]
    async fn renders_recorder_contents_as_text() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("checkin_scans_total", "result" => "success").increment(2);
        });

        let app = Router::new()
            .route("/metrics", get(prometheus_metrics))
            .with_state(MetricsState { handle });
        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("checkin_scans_total{result=\"success\"} 2"));
    }
}
