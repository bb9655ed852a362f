//! Length-prefixed frame I/O.

use crate::error::{NetError, NetResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Writes one frame: big-endian `u32` length, then the payload.
pub(crate) async fn write_frame<S>(stream: &mut S, payload: &[u8]) -> NetResult<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_u32(payload.len() as u32).await?;
    stream.write_all(payload).await?;
    stream.flush().await?;
    Ok(())
}

/// Reads one frame, rejecting declared lengths above `max` before
/// allocating. A clean EOF on the length prefix reads as the peer
/// closing the connection.
pub(crate) async fn read_frame<S>(stream: &mut S, max: usize) -> NetResult<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let len = match stream.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(NetError::Closed),
        Err(e) => return Err(NetError::Io(e)),
    };

    if len > max {
        return Err(NetError::FrameTooLarge { len, max });
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}
