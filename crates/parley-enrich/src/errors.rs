//! Error taxonomy for the enrichment collaborator clients.

/// Failures talking to an enrichment collaborator.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild {
        /// Error description.
        reason: String,
    },

    /// Transport-level failure: connection refused, DNS, timeout.
    #[error("{service} request failed: {reason}")]
    Transport {
        /// Collaborator name.
        service: &'static str,
        /// Error description.
        reason: String,
    },

    /// The collaborator answered with a non-success status.
    #[error("{service} returned {status}: {body}")]
    Status {
        /// Collaborator name.
        service: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The collaborator answered 2xx with a body we could not decode.
    #[error("{service} response decode failed: {reason}")]
    Decode {
        /// Collaborator name.
        service: &'static str,
        /// Error description.
        reason: String,
    },
}

/// Cap response bodies carried inside errors so a chatty collaborator
/// cannot blow up log lines.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 256;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut cut = MAX;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…", &body[..cut])
    }
}
