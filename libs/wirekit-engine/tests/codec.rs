use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wirekit_api::error::ErrorKind;
use wirekit_api::message::MessageInstance;
use wirekit_api::schema::{FieldDescriptor, MessageDescriptor, ScalarType};
use wirekit_api::value::{FieldValue, Value};
use wirekit_engine::builtin::{self, EVENT_LISTENING_ENDPOINTS};
use wirekit_engine::{decode, encode, encoded_len};

const ALL_TYPES: [ScalarType; 15] = [
    ScalarType::String,
    ScalarType::Bytes,
    ScalarType::Bool,
    ScalarType::Int32,
    ScalarType::Int64,
    ScalarType::UInt32,
    ScalarType::UInt64,
    ScalarType::SInt32,
    ScalarType::SInt64,
    ScalarType::Fixed32,
    ScalarType::Fixed64,
    ScalarType::SFixed32,
    ScalarType::SFixed64,
    ScalarType::Float,
    ScalarType::Double,
];

fn jms() -> Arc<MessageDescriptor> {
    Arc::new(builtin::jms_connection_parameters().unwrap())
}

/// One optional and one repeated field per scalar type, declared in
/// reverse wire order.
fn everything() -> Arc<MessageDescriptor> {
    let mut fields = Vec::new();
    for (i, ty) in ALL_TYPES.iter().enumerate() {
        let n = i as u32;
        fields.push(FieldDescriptor::optional(format!("opt_{ty}"), 2 * n + 1, *ty));
        fields.push(FieldDescriptor::repeated(format!("rep_{ty}"), 2 * n + 2, *ty));
    }
    // Large wire number exercises multi-byte tags.
    fields.push(FieldDescriptor::optional("far", 100_000, ScalarType::UInt64));
    fields.reverse();
    Arc::new(MessageDescriptor::new("test.Everything", fields).unwrap())
}

fn random_value(rng: &mut StdRng, ty: ScalarType) -> Value {
    match ty {
        ScalarType::String => {
            let len = rng.gen_range(0..12);
            Value::String((0..len).map(|_| rng.gen_range('a'..='z')).collect())
        }
        ScalarType::Bytes => {
            let len = rng.gen_range(0..12);
            Value::Bytes((0..len).map(|_| rng.r#gen::<u8>()).collect())
        }
        ScalarType::Bool => Value::Bool(rng.gen_bool(0.5)),
        ScalarType::Int32 | ScalarType::SInt32 | ScalarType::SFixed32 => {
            Value::Int32(rng.r#gen())
        }
        ScalarType::Int64 | ScalarType::SInt64 | ScalarType::SFixed64 => {
            Value::Int64(rng.r#gen())
        }
        ScalarType::UInt32 | ScalarType::Fixed32 => Value::UInt32(rng.r#gen()),
        ScalarType::UInt64 | ScalarType::Fixed64 => Value::UInt64(rng.r#gen()),
        ScalarType::Float => Value::Float32(rng.gen_range(-1.0e6..1.0e6)),
        ScalarType::Double => Value::Float64(rng.gen_range(-1.0e12..1.0e12)),
    }
}

fn random_instance(rng: &mut StdRng, desc: &Arc<MessageDescriptor>) -> MessageInstance {
    let mut msg = MessageInstance::new(Arc::clone(desc));
    for field in desc.fields() {
        if !rng.gen_bool(0.6) {
            continue;
        }
        let ty = field.scalar_type();
        if field.is_repeated() {
            let n = rng.gen_range(0..4);
            let values: Vec<Value> = (0..n).map(|_| random_value(rng, ty)).collect();
            msg.set(field.name(), values).unwrap();
        } else {
            msg.set(field.name(), random_value(rng, ty)).unwrap();
        }
    }
    msg
}

#[test]
fn round_trip_random_instances() {
    let desc = everything();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let msg = random_instance(&mut rng, &desc);
        let bytes = encode(&msg);
        assert_eq!(encoded_len(&msg), bytes.len());
        let back = decode(&bytes, &desc).unwrap();
        assert_eq!(back, msg, "bytes: {bytes:02x?}");
    }
}

#[test]
fn declaration_order_does_not_change_bytes() {
    let desc = everything();
    let mut reordered: Vec<FieldDescriptor> = desc.fields().to_vec();
    reordered.reverse();
    let other = Arc::new(MessageDescriptor::new("test.Everything", reordered).unwrap());

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..100 {
        let msg = random_instance(&mut rng, &desc);
        let mut copy = MessageInstance::new(Arc::clone(&other));
        for (field, value) in msg.present_fields() {
            copy.set(field.name(), value.clone()).unwrap();
        }
        assert_eq!(encode(&msg), encode(&copy));
    }
}

#[test]
fn unknown_fields_survive_re_encoding() {
    let full = everything();
    let narrow = Arc::new(
        MessageDescriptor::new(
            "test.Everything",
            vec![FieldDescriptor::optional("opt_string", 1, ScalarType::String)],
        )
        .unwrap(),
    );

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let msg = random_instance(&mut rng, &full);
        let bytes = encode(&msg);
        let partial = decode(&bytes, &narrow).unwrap();
        // Canonical input: the known field leads, every other record is unknown.
        assert_eq!(encode(&partial), bytes);
        assert_eq!(decode(&encode(&partial), &full).unwrap(), msg);
    }
}

#[test]
fn absent_optional_stays_absent() {
    let desc = everything();
    let mut msg = MessageInstance::new(Arc::clone(&desc));
    msg.set("opt_int32", Value::Int32(5)).unwrap();
    let back = decode(&encode(&msg), &desc).unwrap();
    for field in desc.fields() {
        let expect = field.name() == "opt_int32";
        assert_eq!(back.has(field.name()).unwrap(), expect, "{}", field.name());
    }
}

fn endpoints_bytes() -> Vec<u8> {
    let mut expected = Vec::new();
    for endpoint in ["tcp://a:61616", "tcp://b:61616"] {
        expected.push(0x0a);
        expected.push(endpoint.len() as u8);
        expected.extend_from_slice(endpoint.as_bytes());
    }
    expected
}

#[test]
fn event_listening_endpoints_scenario() {
    let desc = jms();
    let mut msg = MessageInstance::new(Arc::clone(&desc));
    msg.set(
        EVENT_LISTENING_ENDPOINTS,
        vec![Value::from("tcp://a:61616"), Value::from("tcp://b:61616")],
    )
    .unwrap();

    let bytes = encode(&msg);
    assert_eq!(bytes, endpoints_bytes());

    let back = decode(&bytes, &desc).unwrap();
    assert_eq!(
        back.get_str_list(EVENT_LISTENING_ENDPOINTS).unwrap(),
        vec!["tcp://a:61616", "tcp://b:61616"]
    );
    assert!(back.unknown_fields().is_empty());
}

#[test]
fn truncated_after_first_tag_is_malformed() {
    let bytes = endpoints_bytes();
    let err = decode(&bytes[..1], &jms()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn every_proper_prefix_is_rejected_or_shorter() {
    let bytes = endpoints_bytes();
    let desc = jms();
    for cut in 1..bytes.len() {
        match decode(&bytes[..cut], &desc) {
            Err(e) => assert_eq!(e.kind(), ErrorKind::MalformedInput),
            // Only a cut on a record boundary may succeed.
            Ok(msg) => assert_eq!(
                msg.get(EVENT_LISTENING_ENDPOINTS).unwrap(),
                Some(&FieldValue::List(vec![Value::from("tcp://a:61616")]))
            ),
        }
    }
}

#[test]
fn nan_and_negative_zero_round_trip() {
    let desc = everything();
    let mut msg = MessageInstance::new(Arc::clone(&desc));
    msg.set("opt_double", Value::Float64(f64::NAN)).unwrap();
    msg.set("opt_float", Value::Float32(-0.0)).unwrap();
    msg.set("rep_float", vec![Value::Float32(f32::NAN), Value::Float32(0.0)])
        .unwrap();

    let back = decode(&encode(&msg), &desc).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn empty_input_is_empty_instance() {
    let msg = decode(&[], &jms()).unwrap();
    assert!(msg.is_empty());
    assert!(encode(&msg).is_empty());
}
