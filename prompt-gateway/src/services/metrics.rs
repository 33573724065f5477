//! GenAI metrics for the gateway.
//!
//! Recorded through the `metrics` facade; exported by whatever recorder the
//! binary installed (Prometheus in production, none in tests).

use metrics::{counter, histogram};

pub const GENAI_REQUESTS_TOTAL: &str = "genai_requests_total";
pub const GENAI_TOKENS_TOTAL: &str = "genai_tokens_total";
pub const GENAI_PROVIDER_LATENCY_SECONDS: &str = "genai_provider_latency_seconds";
pub const GENAI_PROVIDER_ERRORS_TOTAL: &str = "genai_provider_errors_total";

/// Record a completed generation request.
pub fn record_genai_request(route: &'static str, model: &str, outcome: &'static str) {
    counter!(
        GENAI_REQUESTS_TOTAL,
        "route" => route,
        "model" => model.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record token usage reported by the provider.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    counter!(GENAI_TOKENS_TOTAL, "model" => model.to_string(), "type" => "input")
        .increment(input_tokens.max(0) as u64);
    counter!(GENAI_TOKENS_TOTAL, "model" => model.to_string(), "type" => "output")
        .increment(output_tokens.max(0) as u64);
}

/// Record provider latency.
pub fn record_provider_latency(provider: &'static str, model: &str, duration_secs: f64) {
    histogram!(
        GENAI_PROVIDER_LATENCY_SECONDS,
        "provider" => provider,
        "model" => model.to_string()
    )
    .record(duration_secs);
}

/// Record a provider error.
pub fn record_provider_error(provider: &'static str, error_type: &'static str) {
    counter!(
        GENAI_PROVIDER_ERRORS_TOTAL,
        "provider" => provider,
        "error_type" => error_type
    )
    .increment(1);
}
