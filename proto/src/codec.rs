use crate::{error::ProtoError, frame::Frame};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;

/// Hard cap on a plaintext frame line (§4.2).
pub const MAX_PLAINTEXT_FRAME_BYTES: usize = 16 * 1024;
/// Hard cap on an encrypted frame's base64 line (§4.2).
pub const MAX_ENCRYPTED_FRAME_BYTES: usize = 32 * 1024;
/// Idle read timeout for a single frame (§4.2, §5).
pub const FRAME_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads newline-delimited [`Frame`]s off a byte stream, transparently
/// switching to the AES-GCM-framed variant once a session key is installed.
pub struct FrameReader<R> {
    inner: BufReader<R>,
    key: Option<[u8; 32]>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            key: None,
        }
    }

    /// Switch to encrypted framing for every subsequent read (handshake phase 2).
    pub fn enable_encryption(&mut self, key: [u8; 32]) {
        self.key = Some(key);
    }

    pub async fn read_frame(&mut self) -> Result<Frame, ProtoError> {
        let limit = if self.key.is_some() {
            MAX_ENCRYPTED_FRAME_BYTES
        } else {
            MAX_PLAINTEXT_FRAME_BYTES
        };

        let mut line = String::new();
        let read = match timeout(FRAME_READ_TIMEOUT, self.inner.read_line(&mut line)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(ProtoError::Io(e)),
            Err(_) => return Err(ProtoError::Timeout),
        };
        if read == 0 {
            return Err(ProtoError::ConnectionClosed);
        }
        let line = line.trim_end();
        if line.len() > limit {
            return Err(ProtoError::Oversize { limit });
        }

        let payload = match self.key {
            Some(key) => {
                let sealed = STANDARD
                    .decode(line)
                    .map_err(|_| ProtoError::MalformedJson("not valid base64".into()))?;
                felund_crypto::decrypt_frame(&key, &sealed).map_err(|_| ProtoError::Crypto)?
            }
            None => line.as_bytes().to_vec(),
        };

        serde_json::from_slice(&payload).map_err(|e| ProtoError::MalformedJson(e.to_string()))
    }
}

/// Writes [`Frame`]s to a byte stream, mirroring [`FrameReader`]'s encryption state.
pub struct FrameWriter<W> {
    inner: W,
    key: Option<[u8; 32]>,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { inner: writer, key: None }
    }

    pub fn enable_encryption(&mut self, key: [u8; 32]) {
        self.key = Some(key);
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ProtoError> {
        let body = serde_json::to_vec(frame)
            .map_err(|e| ProtoError::MalformedJson(e.to_string()))?;

        let (line, limit) = match self.key {
            Some(key) => {
                let sealed = felund_crypto::encrypt_frame(&key, &body);
                (STANDARD.encode(sealed), MAX_ENCRYPTED_FRAME_BYTES)
            }
            None => (
                String::from_utf8(body).expect("serde_json output is valid UTF-8"),
                MAX_PLAINTEXT_FRAME_BYTES,
            ),
        };
        if line.len() > limit {
            return Err(ProtoError::Oversize { limit });
        }

        self.inner.write_all(line.as_bytes()).await?;
        self.inner.write_all(b"\n").await?;
        self.inner.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn plaintext_frame_round_trips() {
        let (client, server) = duplex(4096);
        let (client_r, _client_w) = tokio::io::split(client);
        let (_server_r, server_w) = tokio::io::split(server);

        let mut writer = FrameWriter::new(server_w);
        let mut reader = FrameReader::new(client_r);

        let frame = Frame::Challenge {
            server_nonce: "abc123".into(),
        };
        writer.write_frame(&frame).await.unwrap();
        let back = reader.read_frame().await.unwrap();
        assert_eq!(back, frame);
    }

    #[tokio::test]
    async fn encrypted_frame_round_trips() {
        let (client, server) = duplex(4096);
        let (client_r, _client_w) = tokio::io::split(client);
        let (_server_r, server_w) = tokio::io::split(server);

        let key = [9u8; 32];
        let mut writer = FrameWriter::new(server_w);
        writer.enable_encryption(key);
        let mut reader = FrameReader::new(client_r);
        reader.enable_encryption(key);

        let frame = Frame::AnchorPull { since: 42 };
        writer.write_frame(&frame).await.unwrap();
        let back = reader.read_frame().await.unwrap();
        assert_eq!(back, frame);
    }

    #[tokio::test]
    async fn oversize_plaintext_frame_is_rejected() {
        let (client, server) = duplex(1 << 20);
        let (client_r, _client_w) = tokio::io::split(client);
        let (_server_r, server_w) = tokio::io::split(server);

        let mut writer = FrameWriter::new(server_w);
        let mut reader = FrameReader::new(client_r);

        let huge = Frame::MsgsHave {
            msg_ids: vec!["x".repeat(64); 2000],
        };
        assert!(matches!(
            writer.write_frame(&huge).await,
            Err(ProtoError::Oversize { .. })
        ));
        drop(writer);
        assert!(matches!(
            reader.read_frame().await,
            Err(ProtoError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn closed_stream_reads_as_connection_closed() {
        let (client, server) = duplex(64);
        let (client_r, _client_w) = tokio::io::split(client);
        drop(server);
        let mut reader = FrameReader::new(client_r);
        assert!(matches!(
            reader.read_frame().await,
            Err(ProtoError::ConnectionClosed)
        ));
    }
}
