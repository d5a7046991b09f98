//! Text-frame transports. A frame is one protocol message without its
//! line terminator.

use std::time::Duration;

use thiserror::Error;

/// The connection failed or was closed. The session owner decides what next.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection closed by peer")]
    Closed,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },
    #[error("frames must not contain line breaks")]
    InvalidFrame,
}

impl TransportError {
    pub fn is_closed(&self) -> bool {
        matches!(self, TransportError::Closed)
    }
}

/// A bidirectional frame channel to the relay.
///
/// `send` takes `&mut self`, so at most one send is in flight per connection.
/// `recv` must be cancel safe: dropping its future loses no complete frame.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError>;
    async fn recv(&mut self) -> Result<String, TransportError>;
}

pub mod in_memory;
pub mod tcp;
