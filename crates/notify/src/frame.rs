//! Wire framing for notification messages
//!
//! Every frame is a 4-byte big-endian payload length followed by the
//! JSON-encoded [`Message`]. Frames above 1 MiB are refused outright;
//! nothing in this protocol comes close to that size.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::protocol::Message;

const MAX_FRAME_SIZE: u32 = 1024 * 1024;

/// Fill `buf` from the stream, mapping a clean EOF to `ConnectionClosed`
async fn read_exact_or_closed<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => Error::ConnectionClosed,
        _ => Error::Io(e),
    })?;
    Ok(())
}

/// Read and decode one frame
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Message> {
    let mut prefix = [0u8; 4];
    read_exact_or_closed(reader, &mut prefix).await?;

    let len = u32::from_be_bytes(prefix);
    if len == 0 {
        return Err(Error::Protocol("Empty frame".into()));
    }
    if len > MAX_FRAME_SIZE {
        return Err(Error::Protocol(format!(
            "Frame of {} bytes exceeds the {} byte limit",
            len, MAX_FRAME_SIZE
        )));
    }

    let mut payload = vec![0u8; len as usize];
    read_exact_or_closed(reader, &mut payload).await?;

    Message::from_bytes(&payload).map_err(|e| Error::Protocol(format!("Invalid JSON: {}", e)))
}

/// Encode and write one frame, flushing so it goes out immediately
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, msg: &Message) -> Result<()> {
    let payload = msg
        .to_bytes()
        .map_err(|e| Error::Protocol(format!("Serialization failed: {}", e)))?;

    let len = payload.len() as u32;
    if len > MAX_FRAME_SIZE {
        return Err(Error::Protocol(format!(
            "Message of {} bytes exceeds the {} byte limit",
            len, MAX_FRAME_SIZE
        )));
    }

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;

    Ok(())
}
