//! Canonical JSON mapping for message instances.
//!
//! Objects are keyed by each field's JSON name; absent fields are omitted.
//! 64-bit integers are written as strings and read from strings or numbers,
//! bytes use standard base64, and non-finite floats use `"NaN"`,
//! `"Infinity"` and `"-Infinity"`. Unknown wire fields are not represented.

use std::collections::HashSet;
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use serde_json::{Map, Number};

use wirekit_api::format::FormatSerializer;
use wirekit_api::{
    FieldDescriptor, FieldValue, MessageDescriptor, MessageInstance, ScalarType, Value, WireError,
};

// ---- Instance -> JSON ----

pub fn to_json(instance: &MessageInstance) -> serde_json::Value {
    let mut map = Map::new();
    for (field, value) in instance.present_fields() {
        let json = match value {
            FieldValue::Single(v) => value_to_json(v),
            FieldValue::List(values) => {
                serde_json::Value::Array(values.iter().map(value_to_json).collect())
            }
        };
        map.insert(field.json_name().to_owned(), json);
    }
    serde_json::Value::Object(map)
}

fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Bool(b) => Json::Bool(*b),
        Value::Int32(v) => Json::from(*v),
        Value::UInt32(v) => Json::from(*v),
        Value::Int64(v) => Json::String(v.to_string()),
        Value::UInt64(v) => Json::String(v.to_string()),
        Value::Float32(v) => float_to_json(f64::from(*v)),
        Value::Float64(v) => float_to_json(*v),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::String(general_purpose::STANDARD.encode(b)),
    }
}

fn float_to_json(v: f64) -> serde_json::Value {
    match Number::from_f64(v) {
        Some(n) => serde_json::Value::Number(n),
        None if v.is_nan() => serde_json::Value::String("NaN".into()),
        None if v > 0.0 => serde_json::Value::String("Infinity".into()),
        None => serde_json::Value::String("-Infinity".into()),
    }
}

// ---- JSON -> Instance ----

/// Build an instance of `descriptor` from a JSON object.
///
/// Keys may be either the JSON name or the declared field name, but not
/// both for the same field. `null` leaves a field absent. Unknown or
/// repeated keys and values of the wrong JSON kind fail with
/// `MalformedInput`.
pub fn from_json(
    json: &serde_json::Value,
    descriptor: &Arc<MessageDescriptor>,
) -> Result<MessageInstance, WireError> {
    let object = json.as_object().ok_or_else(|| {
        WireError::malformed(format!(
            "expected a JSON object for {}",
            descriptor.full_name()
        ))
    })?;

    let mut instance = MessageInstance::new(Arc::clone(descriptor));
    let mut seen = HashSet::with_capacity(object.len());
    for (key, raw) in object {
        let field = descriptor
            .field_by_json_name(key)
            .or_else(|| descriptor.field_by_name(key))
            .ok_or_else(|| {
                WireError::malformed(format!(
                    "unknown field '{key}' for {}",
                    descriptor.full_name()
                ))
            })?;
        if !seen.insert(field.number()) {
            return Err(WireError::malformed(format!(
                "field '{}' given more than once",
                field.name()
            )));
        }
        if raw.is_null() {
            continue;
        }
        let value = field_from_json(field, raw)
            .map_err(|e| e.with_context(format!("field '{key}'")))?;
        instance.set(field.name(), value)?;
    }
    Ok(instance)
}

fn field_from_json(
    field: &FieldDescriptor,
    raw: &serde_json::Value,
) -> Result<FieldValue, WireError> {
    let scalar = field.scalar_type();
    if field.is_repeated() {
        let items = raw
            .as_array()
            .ok_or_else(|| WireError::malformed("expected an array"))?;
        let values = items
            .iter()
            .map(|item| value_from_json(scalar, item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FieldValue::List(values))
    } else {
        Ok(FieldValue::Single(value_from_json(scalar, raw)?))
    }
}

fn value_from_json(scalar: ScalarType, raw: &serde_json::Value) -> Result<Value, WireError> {
    let mismatch = || WireError::malformed(format!("expected {scalar}, got {raw}"));

    let value = match scalar {
        ScalarType::Bool => Value::Bool(raw.as_bool().ok_or_else(mismatch)?),
        ScalarType::String => Value::String(raw.as_str().ok_or_else(mismatch)?.to_owned()),
        ScalarType::Bytes => {
            let text = raw.as_str().ok_or_else(mismatch)?;
            let bytes = general_purpose::STANDARD
                .decode(text)
                .map_err(|e| WireError::malformed(format!("invalid base64: {e}")))?;
            Value::Bytes(bytes)
        }
        ScalarType::Int32 | ScalarType::SInt32 | ScalarType::SFixed32 => {
            Value::Int32(integer(raw, &mismatch)?)
        }
        ScalarType::Int64 | ScalarType::SInt64 | ScalarType::SFixed64 => {
            Value::Int64(integer(raw, &mismatch)?)
        }
        ScalarType::UInt32 | ScalarType::Fixed32 => Value::UInt32(integer(raw, &mismatch)?),
        ScalarType::UInt64 | ScalarType::Fixed64 => Value::UInt64(integer(raw, &mismatch)?),
        ScalarType::Float => {
            let wide = float(raw, &mismatch)?;
            let narrow = wide as f32;
            if wide.is_finite() && !narrow.is_finite() {
                return Err(WireError::malformed(format!("{raw} is out of range for float")));
            }
            Value::Float32(narrow)
        }
        ScalarType::Double => Value::Float64(float(raw, &mismatch)?),
    };
    Ok(value)
}

/// Integer from a JSON number or a decimal string, range-checked.
fn integer<T>(
    raw: &serde_json::Value,
    mismatch: &dyn Fn() -> WireError,
) -> Result<T, WireError>
where
    T: TryFrom<i64> + TryFrom<u64> + std::str::FromStr,
{
    let out_of_range = || WireError::malformed(format!("{raw} is out of range"));
    match raw {
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                <T as TryFrom<u64>>::try_from(v).map_err(|_| out_of_range())
            } else if let Some(v) = n.as_i64() {
                <T as TryFrom<i64>>::try_from(v).map_err(|_| out_of_range())
            } else {
                Err(mismatch())
            }
        }
        serde_json::Value::String(s) => s.parse::<T>().map_err(|_| mismatch()),
        _ => Err(mismatch()),
    }
}

fn float(raw: &serde_json::Value, mismatch: &dyn Fn() -> WireError) -> Result<f64, WireError> {
    match raw {
        serde_json::Value::Number(n) => n.as_f64().ok_or_else(mismatch),
        serde_json::Value::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => other.parse::<f64>().map_err(|_| mismatch()),
        },
        _ => Err(mismatch()),
    }
}

// ---- FormatSerializer ----

/// `FormatSerializer` over the JSON mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat {
    pretty: bool,
}

impl JsonFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl FormatSerializer for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn deserialize(
        &self,
        bytes: &[u8],
        descriptor: &Arc<MessageDescriptor>,
    ) -> Result<MessageInstance, WireError> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        from_json(&json, descriptor)
    }

    fn serialize(&self, instance: &MessageInstance) -> Result<Vec<u8>, WireError> {
        let json = to_json(instance);
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&json)?
        } else {
            serde_json::to_vec(&json)?
        };
        Ok(bytes)
    }
}
