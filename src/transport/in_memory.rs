use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::transport::{Transport, TransportError};

/// One end of an in-process frame channel.
pub struct InMemoryTransport {
    outgoing: UnboundedSender<String>,
    incoming: UnboundedReceiver<String>,
}

impl InMemoryTransport {
    /// Two connected ends: what one sends, the other receives.
    pub fn pair() -> (Self, Self) {
        let (tx1, rx1) = unbounded_channel();
        let (tx2, rx2) = unbounded_channel();
        (
            Self {
                outgoing: tx1,
                incoming: rx2,
            },
            Self {
                outgoing: tx2,
                incoming: rx1,
            },
        )
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        if frame.contains('\n') {
            return Err(TransportError::InvalidFrame);
        }
        self.outgoing
            .send(frame.to_string())
            .map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Result<String, TransportError> {
        self.incoming.recv().await.ok_or(TransportError::Closed)
    }
}
