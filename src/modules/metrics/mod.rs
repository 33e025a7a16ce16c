// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::LazyLock;

use crate::mailorder_version;
use crate::modules::{context::Initialize, error::OrderResult};
use prometheus::{
    register_gauge, register_gauge_vec, register_histogram, register_int_counter,
    register_int_counter_vec, Gauge, GaugeVec, Histogram, IntCounter, IntCounterVec,
};

pub mod endpoint;

pub const SENT: &str = "sent";
pub const SKIPPED: &str = "skipped";
pub const FAILED: &str = "failed";

// Metric name constants
pub const METRIC_RUNS_TOTAL: &str = "mailorder_runs_total";
pub const METRIC_ARCHIVE_FAILURES_TOTAL: &str = "mailorder_archive_failures_total";
pub const METRIC_SESSION_CLOSE_FAILURES_TOTAL: &str = "mailorder_session_close_failures_total";
pub const METRIC_EMAIL_SENT_BYTES: &str = "mailorder_email_sent_bytes";
pub const METRIC_RUN_DURATION_SECONDS: &str = "mailorder_run_duration_seconds";
pub const METRIC_BUILD_INFO: &str = "mailorder_build_info";
pub const METRIC_START_TIMESTAMP: &str = "mailorder_start_timestamp";

pub static MAILORDER_BUILD_INFO: LazyLock<GaugeVec> = LazyLock::new(|| {
    register_gauge_vec!(
        METRIC_BUILD_INFO,
        "Build information including version and commit hash",
        &["version", "commit"]
    )
    .expect("Failed to register mailorder_build_info")
});

pub static MAILORDER_START_TIMESTAMP: LazyLock<Gauge> = LazyLock::new(|| {
    register_gauge!(
        METRIC_START_TIMESTAMP,
        "Unix timestamp when the mailorder process started"
    )
    .expect("Failed to register mailorder_start_timestamp")
});

pub static MAILORDER_RUNS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        METRIC_RUNS_TOTAL,
        "Total number of order runs, grouped by outcome (sent, skipped, failed)",
        &["outcome"]
    )
    .expect("Failed to register mailorder_runs_total")
});

pub static MAILORDER_ARCHIVE_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        METRIC_ARCHIVE_FAILURES_TOTAL,
        "Number of composed orders that could not be appended to the sent mailbox"
    )
    .expect("Failed to register mailorder_archive_failures_total")
});

pub static MAILORDER_SESSION_CLOSE_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        METRIC_SESSION_CLOSE_FAILURES_TOTAL,
        "Number of mailbox sessions whose LOGOUT failed"
    )
    .expect("Failed to register mailorder_session_close_failures_total")
});

pub static MAILORDER_EMAIL_SENT_BYTES: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        METRIC_EMAIL_SENT_BYTES,
        "Total bytes of successfully transmitted orders"
    )
    .expect("Failed to register mailorder_email_sent_bytes")
});

pub static MAILORDER_RUN_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        METRIC_RUN_DURATION_SECONDS,
        "Distribution of order run durations, measured in seconds"
    )
    .expect("Failed to register mailorder_run_duration_seconds")
});

pub struct MetricsService;

impl Initialize for MetricsService {
    async fn initialize() -> OrderResult<()> {
        MAILORDER_START_TIMESTAMP.set(chrono::Utc::now().timestamp() as f64);
        let version = mailorder_version!();
        let commit = env!("GIT_HASH");
        MAILORDER_BUILD_INFO
            .with_label_values(&[version, commit])
            .set(1.0);
        Ok(())
    }
}
