//! Call frame encoding

use crate::types::Header;

/// Alignment the host expects for 32-bit arguments.
const ARG_ALIGN: usize = 4;

/// Largest call frame in the protocol (`drive_set_speed_angle`).
const MAX_FRAME_LEN: usize = 12;

/// An encoded request: header byte followed by fixed-width arguments.
///
/// Float arguments are aligned to 4 bytes from the start of the frame, so the
/// pad bytes between the header and the first float are part of the layout.
///
/// ```rust
/// use racecar_link::types::Header;
/// use racecar_link::wire::CallFrame;
///
/// let frame = CallFrame::new(Header::DriveSetSpeedAngle).push_f32(1.0).push_f32(0.0);
/// assert_eq!(frame.as_bytes().len(), 12);
/// assert_eq!(&frame.as_bytes()[4..8], &1.0f32.to_le_bytes());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    header: Header,
    bytes: Vec<u8>,
}

impl CallFrame {
    pub fn new(header: Header) -> Self {
        let mut bytes = Vec::with_capacity(MAX_FRAME_LEN);
        bytes.push(header.tag());
        Self { header, bytes }
    }

    /// Append a single unaligned byte (enum arguments).
    pub fn push_u8(mut self, value: u8) -> Self {
        self.bytes.push(value);
        self
    }

    /// Append a little-endian `f32`, zero-padding to the next 4-byte boundary first.
    pub fn push_f32(mut self, value: f32) -> Self {
        let padded = self.bytes.len().next_multiple_of(ARG_ALIGN);
        self.bytes.resize(padded, 0);
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn header(&self) -> Header {
        self.header
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Decoded view of a call frame, used by hosts and fakes to read arguments back.
#[derive(Debug, Clone, Copy)]
pub struct CallArgs<'a> {
    pub header: Header,
    bytes: &'a [u8],
}

impl<'a> CallArgs<'a> {
    /// Split a datagram into its header and argument bytes.
    ///
    /// Returns `None` for an empty datagram or an unknown header byte.
    pub fn parse(datagram: &'a [u8]) -> Option<Self> {
        let header = Header::from_tag(*datagram.first()?)?;
        Some(Self { header, bytes: datagram })
    }

    /// Byte argument at `offset` from the frame start.
    pub fn u8_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(offset).copied()
    }

    /// Float argument at `offset` from the frame start.
    pub fn f32_at(&self, offset: usize) -> Option<f32> {
        let raw = self.bytes.get(offset..offset + 4)?;
        Some(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
