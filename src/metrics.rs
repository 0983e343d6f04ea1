use std::sync::Mutex;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
///
/// The recorder is process-global; later calls reuse the first handle.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let mut slot = HANDLE
        .lock()
        .map_err(|_| anyhow::anyhow!("metrics handle lock poisoned"))?;

    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("decisions_recorded_total", "decision" => "copy").absolute(0);
    counter!("decisions_recorded_total", "decision" => "skip").absolute(0);
    counter!("positions_closed_total", "reason" => "manual").absolute(0);
    counter!("positions_closed_total", "reason" => "stop_loss").absolute(0);
    counter!("decisions_expired_total").absolute(0);

    gauge!("open_positions").set(0.0);

    *slot = Some(handle.clone());
    Ok(handle)
}
