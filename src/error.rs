use thiserror::Error;

/// Hard failures of an identification request. Enrichment lookups
/// (encyclopedia, linked data) never surface here; they fail soft and leave
/// optional profile fields empty instead.
#[derive(Error, Debug)]
pub enum IdentifyError {
    /// The upstream endpoint was unreachable or answered with a 5xx status.
    /// Transient; the classifier client retries these with backoff.
    #[error("upstream unavailable{}: {message}", fmt_status(.status))]
    UpstreamUnavailable {
        status: Option<u16>,
        message: String,
    },

    /// Missing or empty API key / model id. Fatal until the caller fixes
    /// its configuration; never retried.
    #[error("upstream configuration error: {0}")]
    UpstreamConfiguration(String),

    /// The configured model has been retired by the provider. Fatal;
    /// requires reconfiguration to a different model id, never retried.
    #[error("upstream model deprecated: {0}")]
    UpstreamDeprecated(String),

    /// A non-5xx HTTP rejection that is neither a configuration problem nor
    /// a deprecation notice. Never retried.
    #[error("upstream rejected request ({status}): {message}")]
    UpstreamRejected { status: u16, message: String },
}

impl IdentifyError {
    /// Whether the retry loop in the classifier client may try again.
    pub fn is_transient(&self) -> bool {
        matches!(self, IdentifyError::UpstreamUnavailable { .. })
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" ({code})"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, IdentifyError>;
