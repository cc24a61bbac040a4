use uuid::Uuid;

/// A 32 hex character trace id.
pub fn generate_trace_id() -> String {
    Uuid::new_v4().as_simple().to_string()
}

/// Create an info-level span for one named operation and return it with its
/// trace id so callers can echo the id elsewhere.
pub fn operation_span(operation: &str) -> (tracing::Span, String) {
    let trace_id = generate_trace_id();
    let span = tracing::info_span!(
        "operation",
        trace_id = %trace_id,
        operation = %operation,
    );
    (span, trace_id)
}
