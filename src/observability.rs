use std::net::SocketAddr;

use crate::sql::Command;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total queries executed. Labels: command, status.
pub const QUERIES_TOTAL: &str = "clinicd_queries_total";

/// Histogram: query latency in seconds. Labels: command.
pub const QUERY_DURATION_SECONDS: &str = "clinicd_query_duration_seconds";

// ── Booking outcomes ────────────────────────────────────────────

/// Counter: appointments accepted and persisted.
pub const APPOINTMENTS_BOOKED_TOTAL: &str = "clinicd_appointments_booked_total";

/// Counter: appointment requests refused. Labels: reason
/// (`doctor_unavailable`, `overlap`, `invalid`).
pub const APPOINTMENTS_REJECTED_TOTAL: &str = "clinicd_appointments_rejected_total";

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

/// Counter: completed WAL compactions. Labels: status.
pub const WAL_COMPACTIONS_TOTAL: &str = "clinicd_wal_compactions_total";

/// Install the Prometheus exporter on `port`. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::InsertDoctor { .. } => "insert_doctor",
        Command::UpdateDoctor { .. } => "update_doctor",
        Command::InsertAppointment { .. } => "insert_appointment",
        Command::SelectDoctors => "select_doctors",
        Command::SelectAppointments { .. } => "select_appointments",
        Command::SelectOverlap { .. } => "select_overlap",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_distinct() {
        let id = ulid::Ulid::new();
        let labels = [
            command_label(&Command::SelectDoctors),
            command_label(&Command::SelectAppointments { doctor_id: None }),
            command_label(&Command::SelectAppointments { doctor_id: Some(id) }),
        ];
        assert_eq!(labels[0], "select_doctors");
        assert_eq!(labels[1], labels[2]);
        assert_ne!(labels[0], labels[1]);
    }

    #[test]
    fn init_without_port_is_noop() {
        assert!(init(None).is_ok());
    }
}
