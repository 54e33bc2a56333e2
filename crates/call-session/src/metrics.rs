//! Metrics definitions for the call session.
//!
//! All metrics follow Prometheus naming conventions:
//! - `call_` prefix
//! - `_total` suffix for counters
//!
//! Labels are bounded enum strings (update kinds, outcome names and
//! `SessionError::error_type_label` values), never peer ids or titles.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `call_engine_updates_total` | Counter | `kind` |
//! | `call_stale_updates_dropped_total` | Counter | `kind` |
//! | `call_load_more_total` | Counter | `status` |
//! | `call_requested_videos` | Gauge | none |
//! | `call_reconnects_total` | Counter | none |
//! | `call_session_errors_total` | Counter | `error_type` |

use metrics::{counter, gauge};

/// Record an applied engine update.
///
/// Metric: `call_engine_updates_total`
/// Labels: `kind` (state, network, members, participants)
pub fn record_engine_update(kind: &'static str) {
    counter!("call_engine_updates_total", "kind" => kind).increment(1);
}

/// Record an engine update dropped for carrying an old version.
///
/// Metric: `call_stale_updates_dropped_total`
/// Labels: `kind`
pub fn record_stale_update(kind: &'static str) {
    counter!("call_stale_updates_dropped_total", "kind" => kind).increment(1);
}

/// Record the outcome of a `load_more` request.
///
/// Metric: `call_load_more_total`
/// Labels: `status` (success, rejected, error)
pub fn record_load_more(status: &'static str) {
    counter!("call_load_more_total", "status" => status).increment(1);
}

/// Set the number of active video subscriptions.
///
/// Metric: `call_requested_videos`
pub fn set_requested_videos(count: usize) {
    // usize to f64 conversion is safe for realistic subscription counts
    #[allow(clippy::cast_precision_loss)]
    gauge!("call_requested_videos").set(count as f64);
}

/// Record a `Connected -> Connecting` transition.
///
/// Metric: `call_reconnects_total`
pub fn record_reconnect() {
    counter!("call_reconnects_total").increment(1);
}

/// Record a failed session command.
///
/// Metric: `call_session_errors_total`
/// Labels: `error_type`
pub fn record_error(error_type: &'static str) {
    counter!("call_session_errors_total", "error_type" => error_type).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests execute the recording functions against the global no-op
    // recorder; they do not assert values.

    #[test]
    fn test_record_engine_update() {
        record_engine_update("state");
        record_engine_update("network");
        record_engine_update("members");
        record_engine_update("participants");
    }

    #[test]
    fn test_record_stale_update() {
        record_stale_update("state");
        record_stale_update("members");
    }

    #[test]
    fn test_record_load_more() {
        record_load_more("success");
        record_load_more("rejected");
        record_load_more("error");
    }

    #[test]
    fn test_set_requested_videos() {
        set_requested_videos(0);
        set_requested_videos(25);
    }

    #[test]
    fn test_record_reconnect_and_error() {
        record_reconnect();
        record_error("engine_timeout");
    }
}
