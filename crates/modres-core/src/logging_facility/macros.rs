//! Canonical logging macros
//!
//! Every operation boundary is logged with the same `component`, `op` and
//! `event` fields so that logs can be filtered and asserted on uniformly.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use modres_core::log_op_start;
/// log_op_start!("resolve");
/// log_op_start!("repo_spec", canonical_name = "ccc~2.0");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::modres_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::modres_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use modres_core::log_op_end;
/// log_op_end!("resolve", duration_ms = 42);
/// log_op_end!("resolve", duration_ms = 42, module_count = 7);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::modres_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::modres_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// Accepts anything convertible into an [`ErrorReport`](crate::errors::ErrorReport),
/// including `&ResolveError`. Context set on the report (`module`,
/// `canonical_name`, `request_id`) is logged as fields; unset context is
/// left out.
///
/// # Example
///
/// ```
/// # use modres_core::{log_op_error, errors::{ErrorReport, ResolveError}};
/// let err = ResolveError::DuplicateOverride { module: "ccc".to_string() };
/// log_op_error!("resolve", &err, duration_ms = 10);
///
/// let report = ErrorReport::from(&err).with_canonical_name("ccc~1.0");
/// log_op_error!("repo_spec", report, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let report: $crate::errors::ErrorReport = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::modres_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?report.kind(),
            err_code = report.code(),
            module = report.module(),
            canonical_name = report.canonical_name(),
            request_id = report.request_id().map(|id| id.as_str()),
            "{}",
            report.message()
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let report: $crate::errors::ErrorReport = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::modres_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?report.kind(),
            err_code = report.code(),
            module = report.module(),
            canonical_name = report.canonical_name(),
            request_id = report.request_id().map(|id| id.as_str()),
            $($field)*
        );
    }};
}
