use std::fmt;
use std::num::ParseIntError;
use std::time::Duration;

use crate::period::Field;

/// Byte range within the input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// All errors produced by isoperiod.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum PeriodError {
    /// The text contains nothing the interval grammar recognizes.
    #[error("invalid repeat format")]
    InvalidFormat { input: String },

    /// A numeral matched the grammar but does not fit the field's integer type.
    #[error("invalid {field} '{value}': {source}")]
    InvalidNumber {
        field: Field,
        value: String,
        span: Span,
        input: String,
        #[source]
        source: ParseIntError,
    },

    /// Advancing a timestamp left the representable range.
    #[error("{message}")]
    Overflow { message: String },

    #[error("ticker is already running")]
    AlreadyRunning,

    #[error("ticker did not stop within {waited:?}")]
    ShutdownTimeout { waited: Duration },

    #[error("ticker task failed: {message}")]
    TaskFailed { message: String },

    /// `Ticker::start` was called outside a Tokio runtime.
    #[error("ticker needs a running Tokio runtime")]
    NoRuntime,
}

impl PeriodError {
    pub fn invalid_format(input: impl Into<String>) -> Self {
        Self::InvalidFormat {
            input: input.into(),
        }
    }

    pub fn invalid_number(
        field: Field,
        value: impl Into<String>,
        span: Span,
        input: impl Into<String>,
        source: ParseIntError,
    ) -> Self {
        Self::InvalidNumber {
            field,
            value: value.into(),
            span,
            input: input.into(),
            source,
        }
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        Self::Overflow {
            message: message.into(),
        }
    }

    /// Format a rich error with the offending part of the input underlined.
    pub fn display_rich(&self) -> String {
        match self {
            Self::InvalidFormat { input } => format_span_error(
                "error",
                &self.to_string(),
                &Span::new(0, input.len()),
                input,
                Some("R5/PT30S"),
            ),
            Self::InvalidNumber { span, input, .. } => {
                format_span_error("error", &self.to_string(), span, input, None)
            }
            other => format!("error: {other}"),
        }
    }
}

fn format_span_error(
    prefix: &str,
    message: &str,
    span: &Span,
    input: &str,
    suggestion: Option<&str>,
) -> String {
    let mut out = format!("{prefix}: {message}\n");
    out.push_str(&format!("  {input}\n"));
    let padding = " ".repeat(span.start + 2);
    let underline = "^".repeat((span.end - span.start).max(1));
    out.push_str(&padding);
    out.push_str(&underline);
    if let Some(sug) = suggestion {
        out.push_str(&format!(" expected something like \"{sug}\""));
    }
    out
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
