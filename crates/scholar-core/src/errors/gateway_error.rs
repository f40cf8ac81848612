/// Session gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("backend unreachable: {reason}")]
    BackendUnreachable { reason: String },

    #[error("bad request: {reason}")]
    BadRequest { reason: String },

    #[error("session store error: {reason}")]
    SessionStore { reason: String },
}
