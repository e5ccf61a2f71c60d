use std::net::SocketAddr;
use tracing::{info, warn};

pub const IMPORT_RUNS_TOTAL: &str = "carpool_import_runs_total";
pub const IMPORT_RECORDS_TOTAL: &str = "carpool_import_records_total";
pub const IMPORT_DURATION_SECONDS: &str = "carpool_import_duration_seconds";

/// Install the Prometheus exporter on `port`. Without a call to this the
/// `metrics` macros are no-ops.
pub fn init_metrics(port: u16) {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            info!("Prometheus exporter listening on http://{}/metrics", addr);
        }
        Err(e) => {
            warn!("Prometheus exporter install failed (possibly already installed): {}", e);
        }
    }
}
