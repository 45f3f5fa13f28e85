//! UDP transport over a fixed port pair

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, info, trace};

use super::{Datagram, Transport};
use crate::config::{BridgeConfig, PortPolicy};
use crate::{BridgeError, Result};

/// UDP channel to the simulation host.
///
/// Binds the client port (host → client traffic) and targets the host port
/// (client → host traffic). Registration datagrams go to the host's separate
/// registration port, always from the client port. Only one process can own the client port, which is
/// the single-client guarantee of the protocol.
pub struct UdpTransport {
    recv_socket: UdpSocket,
    /// Present only with [`PortPolicy::Split`].
    send_socket: Option<UdpSocket>,
    host: SocketAddr,
    registry: Option<SocketAddr>,
    timeout: Option<Duration>,
    buffer: Vec<u8>,
}

impl UdpTransport {
    /// Bind the client port described by `config`.
    pub fn bind(config: &BridgeConfig) -> Result<Self> {
        let recv_socket = UdpSocket::bind(config.bind_addr())
            .map_err(|e| BridgeError::transport("bind client port", e))?;
        recv_socket
            .set_read_timeout(config.receive_timeout())
            .map_err(|e| BridgeError::transport("set receive timeout", e))?;

        let send_socket = match config.port_policy {
            PortPolicy::Shared => None,
            PortPolicy::Split => {
                let unspecified = SocketAddr::new(config.bind_host, 0);
                let socket = UdpSocket::bind(unspecified)
                    .map_err(|e| BridgeError::transport("bind send socket", e))?;
                Some(socket)
            }
        };

        let transport = Self {
            recv_socket,
            send_socket,
            host: config.host_addr(),
            registry: config.registration_addr(),
            timeout: config.receive_timeout(),
            buffer: Vec::with_capacity(config.max_datagram_len() + 1),
        };

        info!(
            local = %transport.local_addr()?,
            host = %transport.host,
            registry = ?transport.registry,
            policy = ?config.port_policy,
            max_datagram = config.max_datagram_len(),
            "UDP transport bound"
        );

        Ok(transport)
    }

    /// Address the client receives on. Useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.recv_socket.local_addr().map_err(|e| BridgeError::transport("query local address", e))
    }

    /// Address calls are sent from.
    pub fn send_addr(&self) -> Result<SocketAddr> {
        self.send_socket
            .as_ref()
            .unwrap_or(&self.recv_socket)
            .local_addr()
            .map_err(|e| BridgeError::transport("query send address", e))
    }

    pub fn host_addr(&self) -> SocketAddr {
        self.host
    }

    pub fn registration_addr(&self) -> Option<SocketAddr> {
        self.registry
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        let socket = self.send_socket.as_ref().unwrap_or(&self.recv_socket);
        let sent =
            socket.send_to(payload, self.host).map_err(|e| BridgeError::transport("send", e))?;
        if sent != payload.len() {
            return Err(BridgeError::framing("outbound datagram", payload.len(), sent));
        }
        trace!(len = sent, tag = payload.first().copied(), "sent datagram");
        Ok(())
    }

    fn recv(&mut self, max_len: usize) -> Result<Datagram> {
        // One spare byte so an oversized datagram reads as max_len + 1 instead of
        // being cut down to a plausible max_len.
        self.buffer.resize(max_len + 1, 0);

        match self.recv_socket.recv_from(&mut self.buffer) {
            Ok((len, source)) => {
                trace!(len, %source, "received datagram");
                if source.ip() != self.host.ip() {
                    debug!(%source, host = %self.host, "datagram from unexpected address");
                }
                Ok(Datagram::new(self.buffer[..len].to_vec(), Some(source)))
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(BridgeError::HostUnresponsive { waited: self.timeout.unwrap_or_default() })
            }
            Err(e) => Err(BridgeError::transport("receive", e)),
        }
    }

    fn send_control(&mut self, payload: &[u8]) -> Result<()> {
        let registry = self
            .registry
            .ok_or_else(|| BridgeError::config("No registration port configured"))?;
        let sent = self
            .recv_socket
            .send_to(payload, registry)
            .map_err(|e| BridgeError::transport("send registration", e))?;
        if sent != payload.len() {
            return Err(BridgeError::framing("registration datagram", payload.len(), sent));
        }
        trace!(len = sent, %registry, tag = payload.first().copied(), "sent registration datagram");
        Ok(())
    }
}
