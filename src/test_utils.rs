//! Scripted fake host for exercising the protocol without sockets
//!
//! [`ScriptedTransport`] replays a fixed list of inbound datagrams and records
//! every exchange in order, so tests can assert both what the client sent and
//! how sends interleaved with receives.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::VecDeque;
use std::time::Duration;

use crate::transport::{Datagram, Transport};
use crate::types::{ErrorCode, Header};
use crate::wire::Response;
use crate::{BridgeError, Result};

/// One step observed by the fake host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    /// Datagram the client sent.
    Sent(Vec<u8>),
    /// Datagram the client received.
    Received(Vec<u8>),
}

/// In-memory [`Transport`] driven by a script of host datagrams.
///
/// Once the script runs out, `recv` fails with
/// [`BridgeError::HostUnresponsive`], which ends any lockstep loop cleanly.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    inbound: VecDeque<Vec<u8>>,
    log: Vec<Exchange>,
}

impl ScriptedTransport {
    pub fn new<I>(inbound: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self { inbound: inbound.into_iter().collect(), log: Vec::new() }
    }

    /// Queue another host datagram.
    pub fn push(&mut self, datagram: impl Into<Vec<u8>>) -> &mut Self {
        self.inbound.push_back(datagram.into());
        self
    }

    /// Queue a host frame event.
    pub fn push_event(&mut self, header: Header) -> &mut Self {
        self.push(vec![header.tag()])
    }

    /// Queue the host accepting a registration for car `index`.
    pub fn push_connected(&mut self, index: u8) -> &mut Self {
        self.push(vec![Header::Connect.tag(), index])
    }

    /// Queue the host's answer to a call.
    pub fn push_response(&mut self, response: &Response) -> &mut Self {
        self.push(response.to_bytes())
    }

    /// Queue a host error datagram.
    pub fn push_host_error(&mut self, code: ErrorCode) -> &mut Self {
        self.push(code.datagram().to_vec())
    }

    /// Every exchange so far, in order.
    pub fn log(&self) -> &[Exchange] {
        &self.log
    }

    /// Outbound datagrams only.
    pub fn sent(&self) -> Vec<&[u8]> {
        self.log
            .iter()
            .filter_map(|e| match e {
                Exchange::Sent(bytes) => Some(bytes.as_slice()),
                Exchange::Received(_) => None,
            })
            .collect()
    }

    /// Number of outbound datagrams that start with `header`.
    pub fn count_sent(&self, header: Header) -> usize {
        self.sent().into_iter().filter(|d| d.first() == Some(&header.tag())).count()
    }

    /// Inbound datagrams not yet consumed.
    pub fn remaining(&self) -> usize {
        self.inbound.len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.log.push(Exchange::Sent(payload.to_vec()));
        Ok(())
    }

    fn recv(&mut self, _max_len: usize) -> Result<Datagram> {
        let payload =
            self.inbound.pop_front().ok_or(BridgeError::HostUnresponsive { waited: Duration::ZERO })?;
        self.log.push(Exchange::Received(payload.clone()));
        Ok(Datagram::new(payload, None))
    }
}

/// A color image chunk script: chunk `i` is filled with byte `i`.
pub fn numbered_chunks(chunk_count: usize, chunk_size: usize) -> Vec<Vec<u8>> {
    (0..chunk_count).map(|i| vec![i as u8; chunk_size]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_sends_and_receives_in_order() {
        let mut transport = ScriptedTransport::new([vec![3]]);
        transport.send(&[5]).unwrap();
        let datagram = transport.recv(1).unwrap();

        assert_eq!(datagram.payload, vec![3]);
        assert_eq!(transport.log(), &[Exchange::Sent(vec![5]), Exchange::Received(vec![3])]);
        assert_eq!(transport.count_sent(Header::PythonFinished), 1);
    }

    #[test]
    fn exhausted_script_reads_as_silent_host() {
        let mut transport = ScriptedTransport::default();
        let err = transport.recv(1).unwrap_err();
        assert!(matches!(err, BridgeError::HostUnresponsive { .. }));
    }
}
