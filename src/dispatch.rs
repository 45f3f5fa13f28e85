//! Half-duplex call dispatch over a [`Transport`]
//!
//! Every capability call is one datagram out and, unless it is a cast, exactly
//! one datagram back. `&mut self` on every method keeps calls from overlapping,
//! so a response always belongs to the call just sent.

use serde::Serialize;
use tracing::{debug, trace};

use crate::bulk::{self, ChunkLayout};
use crate::transport::Transport;
use crate::types::FrameEvent;
use crate::wire::{CallFrame, Response, ResponseShape, decode};
use crate::Result;

/// Largest frame event datagram read off the wire. Only the first two bytes
/// carry meaning.
const EVENT_MAX_LEN: usize = 16;

/// Traffic counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Request/response exchanges, bulk requests included.
    pub calls: u64,
    /// Fire-and-forget sends.
    pub casts: u64,
    /// `python_send_next` acknowledgments sent during bulk transfers.
    pub chunk_acks: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Owns the transport and serializes every exchange with the host.
pub struct Dispatcher<T> {
    transport: T,
    stats: DispatchStats,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, stats: DispatchStats::default() }
    }

    /// Send `frame` and decode the single response as `shape`.
    pub fn call(&mut self, frame: &CallFrame, shape: ResponseShape) -> Result<Response> {
        self.send(frame.as_bytes())?;
        let datagram = self.transport.recv(shape.len())?;
        self.stats.calls += 1;
        self.stats.bytes_received += datagram.payload.len() as u64;

        trace!(header = ?frame.header(), len = datagram.payload.len(), "call answered");
        decode(&datagram.payload, shape)
    }

    /// Send `frame` without waiting for anything back.
    pub fn cast(&mut self, frame: &CallFrame) -> Result<()> {
        self.send(frame.as_bytes())?;
        self.stats.casts += 1;
        trace!(header = ?frame.header(), "cast sent");
        Ok(())
    }

    /// Send `frame` and receive a chunked reply laid out as `layout`.
    pub fn call_bulk(&mut self, frame: &CallFrame, layout: ChunkLayout) -> Result<Vec<u8>> {
        self.send(frame.as_bytes())?;
        self.stats.calls += 1;

        let payload = bulk::receive(&mut self.transport, layout)?;
        self.stats.chunk_acks += payload.acks as u64;
        self.stats.bytes_sent += payload.acks as u64 * bulk::ACK.len() as u64;
        self.stats.bytes_received += payload.data.len() as u64;

        debug!(header = ?frame.header(), bytes = payload.data.len(), "bulk call answered");
        Ok(payload.data)
    }

    /// Send `frame` to the registration port and decode the reply as `shape`.
    ///
    /// Registration traffic counts toward bytes only, not calls or casts.
    pub fn call_control(&mut self, frame: &CallFrame, shape: ResponseShape) -> Result<Response> {
        self.send_control(frame.as_bytes())?;
        let datagram = self.transport.recv(shape.len())?;
        self.stats.bytes_received += datagram.payload.len() as u64;

        trace!(header = ?frame.header(), len = datagram.payload.len(), "registration answered");
        decode(&datagram.payload, shape)
    }

    /// Send `frame` to the registration port without waiting for a reply.
    pub fn cast_control(&mut self, frame: &CallFrame) -> Result<()> {
        self.send_control(frame.as_bytes())
    }

    /// Block until the host issues the next frame event.
    pub fn next_event(&mut self) -> Result<FrameEvent> {
        let datagram = self.transport.recv(EVENT_MAX_LEN)?;
        self.stats.bytes_received += datagram.payload.len() as u64;
        FrameEvent::parse(&datagram.payload)
    }

    /// Send a completion or error acknowledgment for the current frame.
    pub fn acknowledge(&mut self, datagram: &[u8]) -> Result<()> {
        self.send(datagram)
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn send(&mut self, datagram: &[u8]) -> Result<()> {
        self.transport.send(datagram)?;
        self.stats.bytes_sent += datagram.len() as u64;
        Ok(())
    }

    fn send_control(&mut self, datagram: &[u8]) -> Result<()> {
        self.transport.send_control(datagram)?;
        self.stats.bytes_sent += datagram.len() as u64;
        Ok(())
    }
}
