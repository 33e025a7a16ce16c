// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::logger::{parse_log_level, LocalTimer};
use crate::modules::settings::cli::SETTINGS;
use std::sync::OnceLock;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

pub static LOG_WORKER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug)]
pub enum FileLoggerError {
    MissingDirectory,
    Appender(InitError),
    Subscriber(tracing::dispatcher::SetGlobalDefaultError),
}

impl std::fmt::Display for FileLoggerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileLoggerError::MissingDirectory => {
                write!(f, "mailorder_log_dir must be set when logging to file")
            }
            FileLoggerError::Appender(e) => write!(f, "failed to create rolling log file: {}", e),
            FileLoggerError::Subscriber(e) => write!(f, "{}", e),
        }
    }
}

pub fn setup_file_logger() -> Result<(), FileLoggerError> {
    let level = parse_log_level(&SETTINGS.mailorder_log_level);
    let with_ansi = SETTINGS.mailorder_ansi_logs;

    let (nonblocking, guard) = order_log_writer()?;
    let _ = LOG_WORKER_GUARD.set(guard);

    let layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_ansi(with_ansi)
        .with_level(true)
        .with_writer(nonblocking)
        .with_target(true);

    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(layer);

    tracing::subscriber::set_global_default(subscriber).map_err(FileLoggerError::Subscriber)
}

fn order_log_writer() -> Result<(NonBlocking, WorkerGuard), FileLoggerError> {
    let dir = SETTINGS
        .mailorder_log_dir
        .clone()
        .ok_or(FileLoggerError::MissingDirectory)?;
    let rolling = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("mailorder")
        .max_log_files(SETTINGS.mailorder_max_log_files)
        .build(dir)
        .map_err(FileLoggerError::Appender)?;
    Ok(tracing_appender::non_blocking(rolling))
}
