//! Metrics definitions for the interview session controller.
//!
//! All metrics follow Prometheus naming conventions:
//! - `interview_session_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded by code:
//! - `endpoint`: 3 values (validate_interview, token, force_end)
//! - `status`: 4 values (success, client_error, server_error, network_error)
//! - `state`: 4 connection states
//! - `kind`: 7 control message kinds plus `unknown`
//! - `step` / `outcome`: 5 termination steps, 3 outcomes
//!
//! Subject and session ids are never used as labels.
//!
//! No recorder is installed here; the host application decides where
//! metrics go.

use metrics::{counter, histogram};
use std::time::Duration;

/// Record a backend HTTP request.
///
/// Metric: `interview_session_api_requests_total`, `interview_session_api_request_duration_seconds`
/// Labels: `endpoint`, `status`
///
/// `status_code` 0 means the request never got a response.
pub fn record_api_request(endpoint: &'static str, status_code: u16, duration: Duration) {
    let status = categorize_status_code(status_code);

    histogram!("interview_session_api_request_duration_seconds",
        "endpoint" => endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("interview_session_api_requests_total",
        "endpoint" => endpoint,
        "status" => status
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        0 => "network_error",
        200..=299 => "success",
        500..=599 => "server_error",
        _ => "client_error",
    }
}

/// Record a session start attempt.
///
/// Metric: `interview_session_starts_total`
/// Labels: `result` (`joined_room` or the pre-join failure class)
pub fn record_session_start(result: &'static str) {
    counter!("interview_session_starts_total", "result" => result).increment(1);
}

/// Record a connection state transition.
///
/// Metric: `interview_session_connection_transitions_total`
/// Labels: `state`
pub fn record_connection_state(state: &'static str) {
    counter!("interview_session_connection_transitions_total", "state" => state).increment(1);
}

/// Record an inbound control message.
///
/// Metric: `interview_session_inbound_messages_total`
/// Labels: `kind`, `result` (`applied`, `ignored`, `malformed`)
pub fn record_inbound_message(kind: &'static str, result: &'static str) {
    counter!("interview_session_inbound_messages_total",
        "kind" => kind,
        "result" => result
    )
    .increment(1);
}

/// Record an outbound control message.
///
/// Metric: `interview_session_outbound_messages_total`
/// Labels: `kind`, `result` (`sent`, `failed`)
pub fn record_outbound_message(kind: &'static str, sent: bool) {
    counter!("interview_session_outbound_messages_total",
        "kind" => kind,
        "result" => if sent { "sent" } else { "failed" }
    )
    .increment(1);
}

/// Record a mute toggle.
///
/// Metric: `interview_session_mute_toggles_total`
/// Labels: `outcome`
pub fn record_mute_toggle(outcome: &'static str) {
    counter!("interview_session_mute_toggles_total", "outcome" => outcome).increment(1);
}

/// Record a termination step outcome.
///
/// Metric: `interview_session_termination_steps_total`
/// Labels: `step`, `outcome`
pub fn record_termination_step(step: &'static str, outcome: &'static str) {
    counter!("interview_session_termination_steps_total",
        "step" => step,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a completed termination sequence.
///
/// Metric: `interview_session_terminations_total`, `interview_session_termination_duration_seconds`
/// Labels: `trigger`
pub fn record_termination(trigger: &'static str, duration: Duration) {
    histogram!("interview_session_termination_duration_seconds", "trigger" => trigger)
        .record(duration.as_secs_f64());
    counter!("interview_session_terminations_total", "trigger" => trigger).increment(1);
}
