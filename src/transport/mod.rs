//! Datagram transport between the client and the simulation host
//!
//! [`Transport`] is the one blocking boundary in the crate. The lockstep loop
//! and the dispatcher only ever see this trait, so tests swap in a scripted
//! fake while production uses [`UdpTransport`].

mod udp;

pub use udp::UdpTransport;

use std::net::SocketAddr;

use crate::Result;

/// One received datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub payload: Vec<u8>,
    /// Sender address, when the transport knows it.
    pub source: Option<SocketAddr>,
}

impl Datagram {
    pub fn new(payload: Vec<u8>, source: Option<SocketAddr>) -> Self {
        Self { payload, source }
    }
}

/// Blocking whole-datagram channel to a single peer.
///
/// Implementations own the destination; callers never address datagrams.
pub trait Transport {
    /// Send one datagram to the simulation host.
    fn send(&mut self, payload: &[u8]) -> Result<()>;

    /// Block until one datagram arrives.
    ///
    /// `max_len` is the largest payload the caller accepts. Implementations
    /// must make a longer datagram detectable, either by returning more than
    /// `max_len` bytes or by failing, and must never silently truncate it to
    /// exactly `max_len`.
    fn recv(&mut self, max_len: usize) -> Result<Datagram>;

    /// Send one datagram to the host's registration port.
    ///
    /// It must leave from the address frame events arrive on, because that is
    /// the address the host registers. Replies arrive through [`Transport::recv`].
    fn send_control(&mut self, payload: &[u8]) -> Result<()> {
        self.send(payload)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        (**self).send(payload)
    }

    fn recv(&mut self, max_len: usize) -> Result<Datagram> {
        (**self).recv(max_len)
    }

    fn send_control(&mut self, payload: &[u8]) -> Result<()> {
        (**self).send_control(payload)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        (**self).send(payload)
    }

    fn recv(&mut self, max_len: usize) -> Result<Datagram> {
        (**self).recv(max_len)
    }

    fn send_control(&mut self, payload: &[u8]) -> Result<()> {
        (**self).send_control(payload)
    }
}
