use std::net::SocketAddr;

use crate::api::Request;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total wire requests executed. Labels: request, status.
pub const REQUESTS_TOTAL: &str = "clinicd_requests_total";

/// Histogram: request latency in seconds. Labels: request.
pub const REQUEST_DURATION_SECONDS: &str = "clinicd_request_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "clinicd_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "clinicd_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "clinicd_connections_rejected_total";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "clinicd_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "clinicd_wal_flush_batch_size";

/// Install the Prometheus metrics exporter on the given port. No-op if `port`
/// is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a Request variant to a short label for metrics.
pub fn request_label(req: &Request) -> &'static str {
    match req {
        Request::GetClinic => "get_clinic",
        Request::UpdateClinic { .. } => "update_clinic",
        Request::AddSession { .. } => "add_session",
        Request::RemoveSession { .. } => "remove_session",
        Request::ListSessions => "list_sessions",
        Request::ScheduledStaff { .. } => "scheduled_staff",
        Request::AvailableStaff { .. } => "available_staff",
        Request::CreateBooking { .. } => "create_booking",
        Request::CancelBooking { .. } => "cancel_booking",
        Request::ListBookings => "list_bookings",
        Request::DailyReport { .. } => "daily_report",
        Request::ChatContext { .. } => "chat_context",
    }
}
