/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed (locally or by the peer).
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// The connect request could not be turned into a valid handshake.
    #[error("invalid connect request: {0}")]
    InvalidRequest(String),

    /// Opening the connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// The connection did not open within the configured window.
    #[error("connection did not open within {0:?}")]
    OpenTimeout(std::time::Duration),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}

impl TransportError {
    /// `true` when the connection never opened within its window, as
    /// opposed to being refused or failing mid-handshake.
    pub fn is_open_timeout(&self) -> bool {
        matches!(self, Self::OpenTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_open_timeout_only_for_open_timeout() {
        assert!(TransportError::OpenTimeout(std::time::Duration::from_secs(1)).is_open_timeout());
        assert!(!TransportError::InvalidRequest("bad url".into()).is_open_timeout());
        assert!(
            !TransportError::ConnectFailed(std::io::ErrorKind::ConnectionRefused.into())
                .is_open_timeout()
        );
    }
}
