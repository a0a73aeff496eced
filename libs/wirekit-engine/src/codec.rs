//! Descriptor-driven binary codec.
//!
//! Encoding walks present fields in ascending wire-number order and emits
//! one tag + value per element; repeated fields are never packed. Unknown
//! fields are appended verbatim after the declared ones.
//!
//! Decoding accepts packed payloads for repeated numeric fields and keeps
//! undeclared fields as raw bytes on the instance.

use std::sync::Arc;

use bytes::{Buf, BufMut};

use wirekit_api::error::WireError;
use wirekit_api::format::FormatSerializer;
use wirekit_api::message::MessageInstance;
use wirekit_api::schema::{FieldDescriptor, MessageDescriptor, ScalarType, WireType};
use wirekit_api::value::Value;

use crate::wire;

// ═══════════════════════════════════════════════════════════════
//  Encode
// ═══════════════════════════════════════════════════════════════

/// Serialize `instance` to a fresh buffer.
pub fn encode(instance: &MessageInstance) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(instance));
    encode_to(instance, &mut buf);
    buf
}

/// Serialize `instance` into `buf`.
pub fn encode_to(instance: &MessageInstance, buf: &mut impl BufMut) {
    for (field, value) in instance.present_fields() {
        let scalar = field.scalar_type();
        for v in value.values() {
            wire::encode_tag(field.number(), scalar.wire_type(), buf);
            encode_value(scalar, v, buf);
        }
    }
    buf.put_slice(instance.unknown_fields().as_bytes());
}

/// Exact number of bytes `encode` produces.
pub fn encoded_len(instance: &MessageInstance) -> usize {
    let declared: usize = instance
        .present_fields()
        .map(|(field, value)| {
            let scalar = field.scalar_type();
            let tag_len = wire::varint_len(wire::tag_value(field.number(), scalar.wire_type()));
            value
                .values()
                .iter()
                .map(|v| tag_len + value_len(scalar, v))
                .sum::<usize>()
        })
        .sum();
    declared + instance.unknown_fields().len()
}

fn encode_value(scalar: ScalarType, value: &Value, buf: &mut impl BufMut) {
    match value {
        Value::Bool(b) => wire::encode_varint(u64::from(*b), buf),
        Value::Int32(v) => match scalar {
            ScalarType::SInt32 => wire::encode_varint(u64::from(wire::zigzag_encode32(*v)), buf),
            ScalarType::SFixed32 => buf.put_i32_le(*v),
            // Negative int32 is sign-extended to ten bytes.
            _ => wire::encode_varint(i64::from(*v) as u64, buf),
        },
        Value::Int64(v) => match scalar {
            ScalarType::SInt64 => wire::encode_varint(wire::zigzag_encode64(*v), buf),
            ScalarType::SFixed64 => buf.put_i64_le(*v),
            _ => wire::encode_varint(*v as u64, buf),
        },
        Value::UInt32(v) => match scalar {
            ScalarType::Fixed32 => buf.put_u32_le(*v),
            _ => wire::encode_varint(u64::from(*v), buf),
        },
        Value::UInt64(v) => match scalar {
            ScalarType::Fixed64 => buf.put_u64_le(*v),
            _ => wire::encode_varint(*v, buf),
        },
        Value::Float32(v) => buf.put_f32_le(*v),
        Value::Float64(v) => buf.put_f64_le(*v),
        Value::String(s) => {
            wire::encode_varint(s.len() as u64, buf);
            buf.put_slice(s.as_bytes());
        }
        Value::Bytes(b) => {
            wire::encode_varint(b.len() as u64, buf);
            buf.put_slice(b);
        }
    }
}

fn value_len(scalar: ScalarType, value: &Value) -> usize {
    match value {
        Value::Bool(_) => 1,
        Value::Int32(v) => match scalar {
            ScalarType::SInt32 => wire::varint_len(u64::from(wire::zigzag_encode32(*v))),
            ScalarType::SFixed32 => 4,
            _ => wire::varint_len(i64::from(*v) as u64),
        },
        Value::Int64(v) => match scalar {
            ScalarType::SInt64 => wire::varint_len(wire::zigzag_encode64(*v)),
            ScalarType::SFixed64 => 8,
            _ => wire::varint_len(*v as u64),
        },
        Value::UInt32(v) => match scalar {
            ScalarType::Fixed32 => 4,
            _ => wire::varint_len(u64::from(*v)),
        },
        Value::UInt64(v) => match scalar {
            ScalarType::Fixed64 => 8,
            _ => wire::varint_len(*v),
        },
        Value::Float32(_) => 4,
        Value::Float64(_) => 8,
        Value::String(s) => wire::varint_len(s.len() as u64) + s.len(),
        Value::Bytes(b) => wire::varint_len(b.len() as u64) + b.len(),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Decode
// ═══════════════════════════════════════════════════════════════

/// Parse `bytes` as an instance of `descriptor`.
///
/// Undeclared wire numbers are preserved as unknown fields. Truncated
/// input, invalid tags and wire types that contradict the declared
/// scalar type fail with `MalformedInput`.
pub fn decode(
    bytes: &[u8],
    descriptor: &Arc<MessageDescriptor>,
) -> Result<MessageInstance, WireError> {
    let mut instance = MessageInstance::new(Arc::clone(descriptor));
    let mut buf = bytes;

    while !buf.is_empty() {
        let record_start = buf;
        let (number, wire_type) = wire::decode_tag(&mut buf)?;

        match descriptor.field_by_number(number) {
            Some(field) => {
                decode_field(field, wire_type, &mut buf, &mut instance).map_err(|e| {
                    e.with_context(format!("field '{}' ({number})", field.name()))
                })?;
            }
            None => {
                wire::skip_value(wire_type, &mut buf)
                    .map_err(|e| e.with_context(format!("unknown field {number}")))?;
                let consumed = record_start.len() - buf.len();
                tracing::trace!(
                    schema = descriptor.full_name(),
                    number,
                    %wire_type,
                    len = consumed,
                    "preserving unknown field"
                );
                instance
                    .unknown_fields_mut()
                    .push_raw(&record_start[..consumed]);
            }
        }
    }

    Ok(instance)
}

fn decode_field(
    field: &FieldDescriptor,
    wire_type: WireType,
    buf: &mut &[u8],
    instance: &mut MessageInstance,
) -> Result<(), WireError> {
    let scalar = field.scalar_type();

    if wire_type == scalar.wire_type() {
        let value = decode_value(scalar, buf)?;
        return instance.merge_by_number(field.number(), value);
    }

    if wire_type == WireType::Len && field.is_repeated() && scalar.is_packable() {
        let mut packed = wire::take_len(buf)?;
        while !packed.is_empty() {
            let value = decode_value(scalar, &mut packed)?;
            instance.merge_by_number(field.number(), value)?;
        }
        return Ok(());
    }

    Err(WireError::malformed(format!(
        "wire type {wire_type} does not match declared type {scalar}"
    )))
}

fn decode_value(scalar: ScalarType, buf: &mut &[u8]) -> Result<Value, WireError> {
    let value = match scalar {
        ScalarType::Bool => Value::Bool(wire::decode_varint(buf)? != 0),
        // int32 is truncated from the 64-bit varint.
        ScalarType::Int32 => Value::Int32(wire::decode_varint(buf)? as i32),
        ScalarType::Int64 => Value::Int64(wire::decode_varint(buf)? as i64),
        ScalarType::UInt32 => Value::UInt32(wire::decode_varint(buf)? as u32),
        ScalarType::UInt64 => Value::UInt64(wire::decode_varint(buf)?),
        ScalarType::SInt32 => {
            Value::Int32(wire::zigzag_decode32(wire::decode_varint(buf)? as u32))
        }
        ScalarType::SInt64 => Value::Int64(wire::zigzag_decode64(wire::decode_varint(buf)?)),
        ScalarType::Fixed32 => {
            wire::ensure_remaining(buf, 4)?;
            Value::UInt32(buf.get_u32_le())
        }
        ScalarType::SFixed32 => {
            wire::ensure_remaining(buf, 4)?;
            Value::Int32(buf.get_i32_le())
        }
        ScalarType::Float => {
            wire::ensure_remaining(buf, 4)?;
            Value::Float32(buf.get_f32_le())
        }
        ScalarType::Fixed64 => {
            wire::ensure_remaining(buf, 8)?;
            Value::UInt64(buf.get_u64_le())
        }
        ScalarType::SFixed64 => {
            wire::ensure_remaining(buf, 8)?;
            Value::Int64(buf.get_i64_le())
        }
        ScalarType::Double => {
            wire::ensure_remaining(buf, 8)?;
            Value::Float64(buf.get_f64_le())
        }
        ScalarType::String => {
            let raw = wire::take_len(buf)?;
            Value::String(std::str::from_utf8(raw)?.to_owned())
        }
        ScalarType::Bytes => Value::Bytes(wire::take_len(buf)?.to_vec()),
    };
    Ok(value)
}

// ═══════════════════════════════════════════════════════════════
//  BinaryFormat
// ═══════════════════════════════════════════════════════════════

/// `FormatSerializer` over the binary wire format.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryFormat;

impl FormatSerializer for BinaryFormat {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn deserialize(
        &self,
        bytes: &[u8],
        descriptor: &Arc<MessageDescriptor>,
    ) -> Result<MessageInstance, WireError> {
        decode(bytes, descriptor)
    }

    fn serialize(&self, instance: &MessageInstance) -> Result<Vec<u8>, WireError> {
        Ok(encode(instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirekit_api::error::ErrorKind;
    use wirekit_api::value::FieldValue;

    fn scalars() -> Arc<MessageDescriptor> {
        Arc::new(
            MessageDescriptor::new(
                "test.Scalars",
                vec![
                    FieldDescriptor::optional("b", 1, ScalarType::Bool),
                    FieldDescriptor::optional("i32", 2, ScalarType::Int32),
                    FieldDescriptor::optional("s32", 3, ScalarType::SInt32),
                    FieldDescriptor::optional("f32", 4, ScalarType::Fixed32),
                    FieldDescriptor::optional("sf64", 5, ScalarType::SFixed64),
                    FieldDescriptor::optional("d", 6, ScalarType::Double),
                    FieldDescriptor::optional("raw", 7, ScalarType::Bytes),
                    FieldDescriptor::repeated("nums", 8, ScalarType::Int64),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn encodes_each_scalar_kind() {
        let desc = scalars();
        let mut msg = MessageInstance::new(Arc::clone(&desc));
        msg.set("b", Value::Bool(true)).unwrap();
        msg.set("i32", Value::Int32(-1)).unwrap();
        msg.set("s32", Value::Int32(-1)).unwrap();
        msg.set("f32", Value::UInt32(1)).unwrap();
        msg.set("sf64", Value::Int64(-2)).unwrap();
        msg.set("d", Value::Float64(1.5)).unwrap();
        msg.set("raw", Value::Bytes(vec![0xde, 0xad])).unwrap();

        let mut expected = vec![0x08, 0x01];
        expected.push(0x10);
        expected.extend_from_slice(&[0xff; 9]);
        expected.push(0x01);
        expected.extend_from_slice(&[0x18, 0x01]);
        expected.extend_from_slice(&[0x25, 0x01, 0x00, 0x00, 0x00]);
        expected.push(0x29);
        expected.extend_from_slice(&(-2i64).to_le_bytes());
        expected.push(0x31);
        expected.extend_from_slice(&1.5f64.to_le_bytes());
        expected.extend_from_slice(&[0x3a, 0x02, 0xde, 0xad]);

        let bytes = encode(&msg);
        assert_eq!(bytes, expected);
        assert_eq!(encoded_len(&msg), bytes.len());
        assert_eq!(decode(&bytes, &desc).unwrap(), msg);
    }

    #[test]
    fn accepts_packed_repeated_numbers() {
        let desc = scalars();
        // field 8, wire type 2, payload: 1, 300
        let bytes = [0x42, 0x03, 0x01, 0xac, 0x02];
        let msg = decode(&bytes, &desc).unwrap();
        assert_eq!(
            msg.get("nums").unwrap(),
            Some(&FieldValue::List(vec![Value::Int64(1), Value::Int64(300)]))
        );
        // Re-encoded unpacked.
        assert_eq!(encode(&msg), vec![0x40, 0x01, 0x40, 0xac, 0x02]);
    }

    #[test]
    fn last_optional_value_wins() {
        let desc = scalars();
        let msg = decode(&[0x10, 0x01, 0x10, 0x02], &desc).unwrap();
        assert_eq!(msg.get("i32").unwrap(), Some(&FieldValue::Single(Value::Int32(2))));
    }

    #[test]
    fn decoded_zero_value_is_absent() {
        let desc = scalars();
        let msg = decode(&[0x08, 0x00], &desc).unwrap();
        assert!(msg.get("b").unwrap().is_none());
        assert!(encode(&msg).is_empty());
    }

    #[test]
    fn wire_type_mismatch_is_malformed() {
        let desc = scalars();
        // field 7 (bytes) sent as varint
        let err = decode(&[0x38, 0x01], &desc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(err.message().contains("raw"));
    }

    #[test]
    fn packed_payload_on_optional_is_malformed() {
        let desc = scalars();
        let err = decode(&[0x12, 0x01, 0x01], &desc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn invalid_utf8_string_is_malformed() {
        let desc = Arc::new(
            MessageDescriptor::new(
                "test.S",
                vec![FieldDescriptor::optional("s", 1, ScalarType::String)],
            )
            .unwrap(),
        );
        let err = decode(&[0x0a, 0x01, 0xff], &desc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn truncated_fixed_width_is_malformed() {
        let desc = scalars();
        let err = decode(&[0x25, 0x01, 0x00], &desc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn unknown_group_is_malformed() {
        let desc = scalars();
        let err = decode(&[0x7b], &desc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn binary_format_round_trips() {
        let desc = scalars();
        let mut msg = MessageInstance::new(Arc::clone(&desc));
        msg.push("nums", Value::Int64(-5)).unwrap();
        let format = BinaryFormat;
        let bytes = format.serialize(&msg).unwrap();
        assert_eq!(format.deserialize(&bytes, &desc).unwrap(), msg);
        assert_eq!(format.name(), "binary");
    }
}
