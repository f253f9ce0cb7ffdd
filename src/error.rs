/// Errors from calls against the remote commerce gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned {status} for {endpoint}")]
    Status { status: u16, endpoint: String },
}

/// Convenience type alias for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;
