//! Metrics for the collection pipeline.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed. `init_metrics` installs the Prometheus exporter
//! only when `GALLERY_METRICS_ADDR` is set.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};

pub const METRICS_ADDR_ENV: &str = "GALLERY_METRICS_ADDR";

/// Every metric the scraper records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    GalleryRuns,
    GalleryFailures,
    PagesFetched,
    PageFetchErrors,
    EntriesParsed,
    ExtractionSuccess,
    ExtractionFallback,
    RecordsInserted,
    RecordsDuplicate,
    RecordsSkipped,
    RecordErrors,
    FetchDuration,
    GalleryDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::GalleryRuns => "gallery_runs_total",
            MetricName::GalleryFailures => "gallery_failures_total",
            MetricName::PagesFetched => "gallery_pages_fetched_total",
            MetricName::PageFetchErrors => "gallery_page_fetch_errors_total",
            MetricName::EntriesParsed => "gallery_entries_parsed_total",
            MetricName::ExtractionSuccess => "gallery_extraction_success_total",
            MetricName::ExtractionFallback => "gallery_extraction_fallback_total",
            MetricName::RecordsInserted => "gallery_records_inserted_total",
            MetricName::RecordsDuplicate => "gallery_records_duplicate_total",
            MetricName::RecordsSkipped => "gallery_records_skipped_total",
            MetricName::RecordErrors => "gallery_record_errors_total",
            MetricName::FetchDuration => "gallery_fetch_duration_seconds",
            MetricName::GalleryDuration => "gallery_run_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus exporter when an address is configured.
/// Returns the bound address, or None when metrics stay disabled.
pub fn init_metrics() -> Option<SocketAddr> {
    let raw = env::var(METRICS_ADDR_ENV).ok()?;
    let addr: SocketAddr = match raw.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Ignoring {}={}: {}", METRICS_ADDR_ENV, raw, e);
            return None;
        }
    };

    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            info!("Prometheus metrics listening on http://{}/metrics", addr);
            Some(addr)
        }
        Err(e) => {
            warn!("Failed to install Prometheus exporter: {}", e);
            None
        }
    }
}

fn increment(name: MetricName, gallery: &str, by: u64) {
    ::metrics::counter!(name.as_str(), "gallery" => gallery.to_string()).increment(by);
}

pub mod fetch {
    use super::{increment, MetricName};
    use std::time::Duration;

    pub fn page_success(gallery: &str, elapsed: Duration) {
        increment(MetricName::PagesFetched, gallery, 1);
        ::metrics::histogram!(MetricName::FetchDuration.as_str(), "gallery" => gallery.to_string())
            .record(elapsed.as_secs_f64());
    }

    pub fn page_error(gallery: &str) {
        increment(MetricName::PageFetchErrors, gallery, 1);
    }
}

pub mod extraction {
    use super::{increment, MetricName};

    pub fn success(gallery: &str) {
        increment(MetricName::ExtractionSuccess, gallery, 1);
    }

    pub fn fallback(gallery: &str) {
        increment(MetricName::ExtractionFallback, gallery, 1);
    }
}

pub mod load {
    use super::{increment, MetricName};

    pub fn inserted(gallery: &str) {
        increment(MetricName::RecordsInserted, gallery, 1);
    }

    pub fn duplicate(gallery: &str) {
        increment(MetricName::RecordsDuplicate, gallery, 1);
    }

    pub fn skipped(gallery: &str) {
        increment(MetricName::RecordsSkipped, gallery, 1);
    }

    pub fn error(gallery: &str) {
        increment(MetricName::RecordErrors, gallery, 1);
    }
}

pub fn gallery_started(gallery: &str) {
    increment(MetricName::GalleryRuns, gallery, 1);
}

pub fn gallery_failed(gallery: &str) {
    increment(MetricName::GalleryFailures, gallery, 1);
}

pub fn entries_parsed(gallery: &str, count: usize) {
    increment(MetricName::EntriesParsed, gallery, count as u64);
}

pub fn gallery_finished(gallery: &str, elapsed: Duration) {
    ::metrics::histogram!(MetricName::GalleryDuration.as_str(), "gallery" => gallery.to_string())
        .record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_follow_prometheus_conventions() {
        assert!(MetricName::RecordsInserted.as_str().ends_with("_total"));
        assert!(MetricName::FetchDuration.as_str().ends_with("_seconds"));
        assert_eq!(MetricName::GalleryRuns.to_string(), "gallery_runs_total");
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        fetch::page_success("gallery_meme", Duration::from_millis(5));
        load::inserted("gallery_meme");
        gallery_finished("gallery_meme", Duration::from_secs(1));
    }
}
