//! Response decoding
//!
//! Responses carry no tag: the caller states what it expects with a
//! [`ResponseShape`] and the payload must match it exactly.

use crate::{BridgeError, Result};

/// Expected layout of an untagged response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// One byte, nonzero is true
    Bool,
    /// Little-endian f32
    Float,
    /// Little-endian i32
    Int,
    /// Two f32 (joystick x, y)
    FloatPair,
    /// Three f32 (x, y, z)
    Vector3,
    /// `n` consecutive f32
    FloatArray(usize),
    /// `n` opaque bytes
    Raw(usize),
}

impl ResponseShape {
    /// Exact payload size in bytes.
    pub const fn len(&self) -> usize {
        match self {
            ResponseShape::Bool => 1,
            ResponseShape::Float | ResponseShape::Int => 4,
            ResponseShape::FloatPair => 8,
            ResponseShape::Vector3 => 12,
            ResponseShape::FloatArray(n) => *n * 4,
            ResponseShape::Raw(n) => *n,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded response value.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Bool(bool),
    Float(f32),
    Int(i32),
    FloatPair([f32; 2]),
    Vector3([f32; 3]),
    FloatArray(Vec<f32>),
    Raw(Vec<u8>),
}

impl Response {
    /// Shape this value was decoded from.
    pub fn shape(&self) -> ResponseShape {
        match self {
            Response::Bool(_) => ResponseShape::Bool,
            Response::Float(_) => ResponseShape::Float,
            Response::Int(_) => ResponseShape::Int,
            Response::FloatPair(_) => ResponseShape::FloatPair,
            Response::Vector3(_) => ResponseShape::Vector3,
            Response::FloatArray(v) => ResponseShape::FloatArray(v.len()),
            Response::Raw(v) => ResponseShape::Raw(v.len()),
        }
    }

    /// Encode as the payload bytes the host would send.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Response::Bool(b) => vec![u8::from(*b)],
            Response::Float(v) => v.to_le_bytes().to_vec(),
            Response::Int(v) => v.to_le_bytes().to_vec(),
            Response::FloatPair(values) => floats_to_bytes(values),
            Response::Vector3(values) => floats_to_bytes(values),
            Response::FloatArray(values) => floats_to_bytes(values),
            Response::Raw(bytes) => bytes.clone(),
        }
    }

    pub fn into_bool(self) -> Result<bool> {
        match self {
            Response::Bool(b) => Ok(b),
            other => Err(mismatch("bool response", ResponseShape::Bool, &other)),
        }
    }

    pub fn into_f32(self) -> Result<f32> {
        match self {
            Response::Float(v) => Ok(v),
            other => Err(mismatch("float response", ResponseShape::Float, &other)),
        }
    }

    pub fn into_i32(self) -> Result<i32> {
        match self {
            Response::Int(v) => Ok(v),
            other => Err(mismatch("int response", ResponseShape::Int, &other)),
        }
    }

    pub fn into_pair(self) -> Result<[f32; 2]> {
        match self {
            Response::FloatPair(v) => Ok(v),
            other => Err(mismatch("float pair response", ResponseShape::FloatPair, &other)),
        }
    }

    pub fn into_vector3(self) -> Result<[f32; 3]> {
        match self {
            Response::Vector3(v) => Ok(v),
            other => Err(mismatch("vector response", ResponseShape::Vector3, &other)),
        }
    }

    pub fn into_floats(self) -> Result<Vec<f32>> {
        match self {
            Response::FloatArray(v) => Ok(v),
            other => {
                let len = other.shape().len() / 4;
                Err(mismatch("float array response", ResponseShape::FloatArray(len), &other))
            }
        }
    }

    pub fn into_raw(self) -> Result<Vec<u8>> {
        match self {
            Response::Raw(v) => Ok(v),
            other => Err(mismatch("raw response", ResponseShape::Raw(other.shape().len()), &other)),
        }
    }
}

fn mismatch(context: &str, wanted: ResponseShape, got: &Response) -> BridgeError {
    let context = format!("{context} (decoded as {:?})", got.shape());
    BridgeError::framing(context, wanted.len(), got.shape().len())
}

fn floats_to_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode `payload` as `shape`.
///
/// The payload length must equal `shape.len()`; shorter or longer payloads are
/// framing errors, never truncated or padded.
pub fn decode(payload: &[u8], shape: ResponseShape) -> Result<Response> {
    let expected = shape.len();
    if payload.len() != expected {
        return Err(BridgeError::framing(format!("{shape:?} response"), expected, payload.len()));
    }

    let response = match shape {
        ResponseShape::Bool => Response::Bool(payload[0] != 0),
        ResponseShape::Float => Response::Float(parse_f32_le(payload, 0)?),
        ResponseShape::Int => Response::Int(parse_i32_le(payload, 0)?),
        ResponseShape::FloatPair => {
            Response::FloatPair([parse_f32_le(payload, 0)?, parse_f32_le(payload, 4)?])
        }
        ResponseShape::Vector3 => Response::Vector3([
            parse_f32_le(payload, 0)?,
            parse_f32_le(payload, 4)?,
            parse_f32_le(payload, 8)?,
        ]),
        ResponseShape::FloatArray(_) => Response::FloatArray(decode_floats(payload)?),
        ResponseShape::Raw(_) => Response::Raw(payload.to_vec()),
    };

    Ok(response)
}

/// Reinterpret a little-endian f32 buffer.
pub fn decode_floats(payload: &[u8]) -> Result<Vec<f32>> {
    if payload.len() % 4 != 0 {
        return Err(BridgeError::framing(
            "float buffer",
            payload.len().next_multiple_of(4),
            payload.len(),
        ));
    }
    Ok(payload.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect())
}

fn parse_f32_le(data: &[u8], offset: usize) -> Result<f32> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or_else(|| BridgeError::framing("f32 field", offset + 4, data.len()))?;
    Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn parse_i32_le(data: &[u8], offset: usize) -> Result<i32> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or_else(|| BridgeError::framing("i32 field", offset + 4, data.len()))?;
    Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn shape_lengths() {
        assert_eq!(ResponseShape::Bool.len(), 1);
        assert_eq!(ResponseShape::Float.len(), 4);
        assert_eq!(ResponseShape::FloatPair.len(), 8);
        assert_eq!(ResponseShape::Vector3.len(), 12);
        assert_eq!(ResponseShape::FloatArray(720).len(), 2880);
        assert_eq!(ResponseShape::Raw(38_400).len(), 38_400);
    }

    #[test]
    fn short_payload_is_fatal() {
        let err = decode(&[0, 0, 128], ResponseShape::Float).unwrap_err();
        assert!(matches!(err, BridgeError::Framing { expected: 4, actual: 3, .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn long_payload_is_fatal() {
        let err = decode(&[1, 0], ResponseShape::Bool).unwrap_err();
        assert!(matches!(err, BridgeError::Framing { expected: 1, actual: 2, .. }));
    }

    #[test]
    fn bool_is_any_nonzero_byte() {
        assert_eq!(decode(&[0], ResponseShape::Bool).unwrap(), Response::Bool(false));
        assert_eq!(decode(&[1], ResponseShape::Bool).unwrap(), Response::Bool(true));
        assert_eq!(decode(&[7], ResponseShape::Bool).unwrap(), Response::Bool(true));
    }

    #[test]
    fn accessor_mismatch_is_a_framing_error() {
        let err = Response::Bool(true).into_f32().unwrap_err();
        assert!(matches!(err, BridgeError::Framing { expected: 4, actual: 1, .. }));
    }

    #[test]
    fn odd_float_buffers_are_rejected() {
        assert!(decode_floats(&[0; 6]).is_err());
        assert_eq!(decode_floats(&[0; 8]).unwrap(), vec![0.0, 0.0]);
    }

    fn arb_response() -> impl Strategy<Value = Response> {
        prop_oneof![
            any::<bool>().prop_map(Response::Bool),
            any::<f32>().prop_map(Response::Float),
            any::<i32>().prop_map(Response::Int),
            any::<[f32; 2]>().prop_map(Response::FloatPair),
            any::<[f32; 3]>().prop_map(Response::Vector3),
            prop::collection::vec(any::<f32>(), 0..64).prop_map(Response::FloatArray),
            prop::collection::vec(any::<u8>(), 0..64).prop_map(Response::Raw),
        ]
    }

    proptest! {
        #[test]
        fn decode_inverts_host_encoding(response in arb_response()) {
            let bytes = response.to_bytes();
            let decoded = decode(&bytes, response.shape()).unwrap();

            // Compare re-encoded bytes so NaN payloads are checked bit for bit.
            prop_assert_eq!(decoded.to_bytes(), bytes);
            prop_assert_eq!(decoded.shape(), response.shape());
        }

        #[test]
        fn any_length_mismatch_fails(len in 0usize..32, shape_len in 0usize..8) {
            let shape = ResponseShape::FloatArray(shape_len);
            prop_assume!(len != shape.len());
            prop_assert!(decode(&vec![0u8; len], shape).is_err());
        }
    }
}
