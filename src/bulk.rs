//! Stop-and-wait transfer of payloads larger than one datagram
//!
//! The host streams a color image as a fixed number of equal chunks and waits
//! for a `python_send_next` acknowledgment after each one before sending the
//! next. Chunk count and size come from configuration; nothing about the layout
//! is read off the wire.
//!
//! ```text
//! client                      host
//!   camera_get_color_image ->
//!                          <- chunk 1
//!   python_send_next       ->
//!                          <- chunk 2
//!   ...
//!                          <- chunk K
//!   python_send_next       ->
//! ```

use tracing::{debug, trace};

use crate::transport::Transport;
use crate::types::Header;
use crate::{BridgeError, Result};

/// Acknowledgment datagram sent after every chunk.
pub const ACK: [u8; 1] = [Header::PythonSendNext.tag()];

/// How a bulk payload is cut into datagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    pub chunk_count: usize,
    pub chunk_size: usize,
}

impl ChunkLayout {
    /// Split `total` bytes into `count` chunks.
    ///
    /// Any remainder is dropped here; [`crate::BridgeConfig::validate`] rejects
    /// layouts that do not divide evenly.
    pub fn split(total: usize, count: usize) -> Self {
        let chunk_size = if count == 0 { 0 } else { total / count };
        Self { chunk_count: count, chunk_size }
    }

    pub fn total_len(&self) -> usize {
        self.chunk_count * self.chunk_size
    }
}

/// A completed bulk transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkPayload {
    pub data: Vec<u8>,
    /// Number of acknowledgments sent, always equal to the chunk count.
    pub acks: usize,
}

/// Receive every chunk of a transfer whose request frame was already sent.
///
/// Each chunk must be exactly `layout.chunk_size` bytes. A chunk of any other
/// length aborts the transfer without acknowledging it, and no partial buffer
/// is returned.
pub fn receive<T: Transport + ?Sized>(
    transport: &mut T,
    layout: ChunkLayout,
) -> Result<BulkPayload> {
    let mut data = Vec::with_capacity(layout.total_len());
    let mut acks = 0;

    for index in 0..layout.chunk_count {
        let chunk = transport.recv(layout.chunk_size)?;
        if chunk.payload.len() != layout.chunk_size {
            return Err(BridgeError::framing(
                format!("bulk chunk {} of {}", index + 1, layout.chunk_count),
                layout.chunk_size,
                chunk.payload.len(),
            ));
        }

        data.extend_from_slice(&chunk.payload);
        transport.send(&ACK)?;
        acks += 1;
        trace!(chunk = index + 1, of = layout.chunk_count, "chunk acknowledged");
    }

    debug!(bytes = data.len(), chunks = acks, "bulk transfer complete");
    Ok(BulkPayload { data, acks })
}
