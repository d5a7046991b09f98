use log::debug;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::transport::{Transport, TransportError};

/// Default timeout for writing one frame.
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum frame size (64 KiB); a `MAP` frame is about 140 bytes.
const MAX_FRAME_LEN: usize = 64 * 1024;

const READ_CHUNK: usize = 1024;

/// Newline-delimited UTF-8 frames over TCP.
pub struct TcpTransport {
    stream: TcpStream,
    /// Bytes read but not yet returned as a frame. Kept across calls so a
    /// cancelled `recv` loses nothing.
    buffer: Vec<u8>,
    send_timeout: Duration,
    /// `None` waits for the opponent indefinitely.
    recv_timeout: Option<Duration>,
    max_frame_len: usize,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            buffer: Vec::new(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
            recv_timeout: None,
            max_frame_len: MAX_FRAME_LEN,
        }
    }

    pub fn with_config(
        stream: TcpStream,
        send_timeout: Duration,
        recv_timeout: Option<Duration>,
        max_frame_len: usize,
    ) -> Self {
        Self {
            stream,
            buffer: Vec::new(),
            send_timeout,
            recv_timeout,
            max_frame_len,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    /// Pop one complete line from the buffer, without its terminator.
    fn take_frame(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        // Invalid UTF-8 surfaces later as a malformed message.
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    async fn fill(&mut self) -> Result<(), TransportError> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = self.stream.read(&mut chunk).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::ConnectionReset {
                TransportError::Closed
            } else {
                TransportError::Io(e)
            }
        })?;
        if n == 0 {
            if !self.buffer.is_empty() {
                debug!(
                    target: "torpedo::transport",
                    "discarding {} bytes of an unterminated frame",
                    self.buffer.len()
                );
                self.buffer.clear();
            }
            return Err(TransportError::Closed);
        }
        self.buffer.extend_from_slice(&chunk[..n]);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        if frame.contains('\n') {
            return Err(TransportError::InvalidFrame);
        }
        if frame.len() > self.max_frame_len {
            return Err(TransportError::FrameTooLarge {
                len: frame.len(),
                max: self.max_frame_len,
            });
        }
        let mut data = Vec::with_capacity(frame.len() + 1);
        data.extend_from_slice(frame.as_bytes());
        data.push(b'\n');

        let limit = self.send_timeout;
        let stream = &mut self.stream;
        let write = async move {
            stream.write_all(&data).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::BrokenPipe
                    || e.kind() == std::io::ErrorKind::ConnectionReset
                {
                    TransportError::Closed
                } else {
                    TransportError::Io(e)
                }
            })?;
            stream.flush().await?;
            Ok::<(), TransportError>(())
        };
        timeout(limit, write)
            .await
            .map_err(|_| TransportError::Timeout(limit))?
    }

    async fn recv(&mut self) -> Result<String, TransportError> {
        loop {
            if let Some(frame) = self.take_frame() {
                return Ok(frame);
            }
            if self.buffer.len() > self.max_frame_len {
                let len = self.buffer.len();
                self.buffer.clear();
                return Err(TransportError::FrameTooLarge {
                    len,
                    max: self.max_frame_len,
                });
            }
            match self.recv_timeout {
                Some(limit) => timeout(limit, self.fill())
                    .await
                    .map_err(|_| TransportError::Timeout(limit))??,
                None => self.fill().await?,
            }
        }
    }
}
