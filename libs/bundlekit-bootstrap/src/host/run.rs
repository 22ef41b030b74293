use std::sync::Arc;

use anyhow::Result;
use bundlekit::{BundleHost, ServiceRegistry, StartReport, TracingLogSink};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

/// Create a host over a fresh registry and install every linked bundle the
/// configuration does not disable.
///
/// # Errors
/// Returns an error if two linked bundles share a name.
pub fn build_host(config: AppConfig) -> Result<BundleHost> {
    let host = BundleHost::new(
        Arc::new(ServiceRegistry::new()),
        Arc::new(config),
        Arc::new(TracingLogSink),
    );
    let installed = host.install_discovered()?;
    tracing::info!(bundles = ?installed, "bundles installed");
    Ok(host)
}

fn log_report(report: &StartReport) {
    for (bundle, err) in &report.failed {
        tracing::warn!(bundle = %bundle, error = %err, "bundle did not start");
    }
}

/// Start every bundle, wait for `cancel`, then shut the host down.
///
/// Bundle failures are logged, never fatal. The returned report describes startup.
pub async fn run_until_cancelled(host: &BundleHost, cancel: &CancellationToken) -> StartReport {
    let report = host.start_all();
    log_report(&report);

    tracing::info!("bundle host running, waiting for shutdown signal");
    cancel.cancelled().await;

    for err in host.shutdown() {
        tracing::warn!(error = %err, "bundle did not stop cleanly");
    }
    report
}

/// Start every bundle and immediately shut the host down.
pub fn run_once(host: &BundleHost) -> StartReport {
    let report = host.start_all();
    log_report(&report);
    for err in host.shutdown() {
        tracing::warn!(error = %err, "bundle did not stop cleanly");
    }
    report
}
