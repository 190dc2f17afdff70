use fairlend::lending::LendingService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Summary of the lending configuration, logged once the listener is bound.
pub(crate) fn describe_service(service: &LendingService) -> String {
    let thresholds = service.engine().thresholds();
    format!(
        "catalog v{} ({} variants), min credit {}, max dti {:.2}, max loan/income {:.2}",
        service.catalog().version(),
        service.catalog().len(),
        thresholds.min_credit_score,
        thresholds.max_dti_ratio,
        thresholds.max_loan_to_income,
    )
}
