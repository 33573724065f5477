pub mod logging;
pub mod metrics;
pub mod trace_context;

pub use logging::{init_tracing, shutdown_tracing};
pub use metrics::install_metrics_recorder;
pub use trace_context::{
    REQUEST_ID_HEADER, TRACEPARENT_HEADER, TRACESTATE_HEADER, TracedClientExt, TracedRequest,
    inject_trace_context,
};
