use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::error::WireError;
use crate::value::Value;

/// Largest wire number a field may carry (29 bits).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Wire numbers reserved by the format itself.
pub const RESERVED_NUMBERS: std::ops::RangeInclusive<u32> = 19_000..=19_999;

// ════════════════════════════════════════════════════════════════
//  Wire Type
// ════════════════════════════════════════════════════════════════

/// Low three bits of every tag. Tells the decoder how to find the end
/// of a value without knowing the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Varint = 0,
    I64 = 1,
    Len = 2,
    StartGroup = 3,
    EndGroup = 4,
    I32 = 5,
}

impl WireType {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(WireType::Varint),
            1 => Some(WireType::I64),
            2 => Some(WireType::Len),
            3 => Some(WireType::StartGroup),
            4 => Some(WireType::EndGroup),
            5 => Some(WireType::I32),
            _ => None,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireType::Varint => f.write_str("varint"),
            WireType::I64 => f.write_str("i64"),
            WireType::Len => f.write_str("len"),
            WireType::StartGroup => f.write_str("sgroup"),
            WireType::EndGroup => f.write_str("egroup"),
            WireType::I32 => f.write_str("i32"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Scalar Type
// ════════════════════════════════════════════════════════════════

/// Declared type of a field. Determines both the accepted `Value` kind
/// and the on-wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    String,
    Bytes,
    Bool,
    Int32,
    Int64,
    UInt32,
    UInt64,
    /// Zigzag-encoded varint.
    SInt32,
    /// Zigzag-encoded varint.
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Float,
    Double,
}

impl ScalarType {
    pub fn wire_type(self) -> WireType {
        match self {
            ScalarType::String | ScalarType::Bytes => WireType::Len,
            ScalarType::Bool
            | ScalarType::Int32
            | ScalarType::Int64
            | ScalarType::UInt32
            | ScalarType::UInt64
            | ScalarType::SInt32
            | ScalarType::SInt64 => WireType::Varint,
            ScalarType::Fixed64 | ScalarType::SFixed64 | ScalarType::Double => WireType::I64,
            ScalarType::Fixed32 | ScalarType::SFixed32 | ScalarType::Float => WireType::I32,
        }
    }

    /// Repeated fields of this type may arrive packed into one
    /// length-delimited payload.
    pub fn is_packable(self) -> bool {
        self.wire_type() != WireType::Len
    }

    /// Whether `value` is the kind this scalar type stores.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ScalarType::String, Value::String(_))
                | (ScalarType::Bytes, Value::Bytes(_))
                | (ScalarType::Bool, Value::Bool(_))
                | (ScalarType::Int32 | ScalarType::SInt32 | ScalarType::SFixed32, Value::Int32(_))
                | (ScalarType::Int64 | ScalarType::SInt64 | ScalarType::SFixed64, Value::Int64(_))
                | (ScalarType::UInt32 | ScalarType::Fixed32, Value::UInt32(_))
                | (ScalarType::UInt64 | ScalarType::Fixed64, Value::UInt64(_))
                | (ScalarType::Float, Value::Float32(_))
                | (ScalarType::Double, Value::Float64(_))
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
            ScalarType::Bool => "bool",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::UInt32 => "uint32",
            ScalarType::UInt64 => "uint64",
            ScalarType::SInt32 => "sint32",
            ScalarType::SInt64 => "sint64",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::SFixed32 => "sfixed32",
            ScalarType::SFixed64 => "sfixed64",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        };
        f.write_str(name)
    }
}

// ════════════════════════════════════════════════════════════════
//  Cardinality
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// Zero or one value.
    #[default]
    Optional,
    /// Zero or more values, order preserved.
    Repeated,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Optional => f.write_str("optional"),
            Cardinality::Repeated => f.write_str("repeated"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Field Descriptor
// ════════════════════════════════════════════════════════════════

/// One field of a message: name, wire number, cardinality and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    number: u32,
    cardinality: Cardinality,
    scalar_type: ScalarType,
    json_name: String,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        number: u32,
        cardinality: Cardinality,
        scalar_type: ScalarType,
    ) -> Self {
        let name = name.into();
        let json_name = to_json_name(&name);
        Self {
            name,
            number,
            cardinality,
            scalar_type,
            json_name,
        }
    }

    /// Shortcut: optional field.
    pub fn optional(name: impl Into<String>, number: u32, scalar_type: ScalarType) -> Self {
        Self::new(name, number, Cardinality::Optional, scalar_type)
    }

    /// Shortcut: repeated field.
    pub fn repeated(name: impl Into<String>, number: u32, scalar_type: ScalarType) -> Self {
        Self::new(name, number, Cardinality::Repeated, scalar_type)
    }

    /// Override the derived JSON name.
    pub fn with_json_name(mut self, json_name: impl Into<String>) -> Self {
        self.json_name = json_name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }

    pub fn json_name(&self) -> &str {
        &self.json_name
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    fn validate(&self) -> Result<(), WireError> {
        if !is_identifier(&self.name) {
            return Err(WireError::invalid_schema(format!(
                "invalid field name '{}'",
                self.name
            )));
        }
        if self.number == 0 || self.number > MAX_FIELD_NUMBER {
            return Err(WireError::invalid_schema(format!(
                "field '{}': wire number {} out of range 1..={MAX_FIELD_NUMBER}",
                self.name, self.number
            )));
        }
        if RESERVED_NUMBERS.contains(&self.number) {
            return Err(WireError::invalid_schema(format!(
                "field '{}': wire number {} is reserved",
                self.name, self.number
            )));
        }
        if self.json_name.is_empty() {
            return Err(WireError::invalid_schema(format!(
                "field '{}': empty json name",
                self.name
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} = {};",
            self.cardinality, self.scalar_type, self.name, self.number
        )
    }
}

// ════════════════════════════════════════════════════════════════
//  Message Descriptor
// ════════════════════════════════════════════════════════════════

/// Validated, immutable description of a message type.
///
/// `fields` keeps declaration order; `by_number` is sorted by wire number
/// and drives canonical encoding.
#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    full_name: String,
    fields: Vec<FieldDescriptor>,
    by_number: Vec<usize>,
    by_name: HashMap<String, usize>,
}

impl MessageDescriptor {
    /// Build a descriptor. Fails with `InvalidSchema` on a malformed
    /// qualified name, bad field, duplicate field name/number, or a JSON
    /// name that clashes with another field's JSON or declared name.
    pub fn new(
        full_name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, WireError> {
        let full_name = full_name.into();
        if full_name.is_empty() || !full_name.split('.').all(is_identifier) {
            return Err(WireError::invalid_schema(format!(
                "invalid message name '{full_name}'"
            )));
        }

        let mut by_name = HashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            field.validate().map_err(|e| e.with_context(&full_name))?;
            if by_name.insert(field.name.clone(), idx).is_some() {
                return Err(WireError::invalid_schema(format!(
                    "{full_name}: duplicate field name '{}'",
                    field.name
                )));
            }
        }

        let mut by_number: Vec<usize> = (0..fields.len()).collect();
        by_number.sort_by_key(|&idx| fields[idx].number);
        for pair in by_number.windows(2) {
            let (a, b) = (&fields[pair[0]], &fields[pair[1]]);
            if a.number == b.number {
                return Err(WireError::invalid_schema(format!(
                    "{full_name}: fields '{}' and '{}' share wire number {}",
                    a.name, b.name, a.number
                )));
            }
        }

        // JSON objects accept either name as a key.
        let mut by_json: HashMap<&str, &str> = HashMap::with_capacity(fields.len());
        for field in &fields {
            if let Some(prev) = by_json.insert(&field.json_name, &field.name) {
                return Err(WireError::invalid_schema(format!(
                    "{full_name}: fields '{prev}' and '{}' share json name '{}'",
                    field.name, field.json_name
                )));
            }
            if by_name
                .get(&field.json_name)
                .is_some_and(|&idx| fields[idx].name != field.name)
            {
                return Err(WireError::invalid_schema(format!(
                    "{full_name}: json name '{}' of field '{}' is the name of another field",
                    field.json_name, field.name
                )));
            }
        }

        Ok(Self {
            full_name,
            fields,
            by_number,
            by_name,
        })
    }

    /// Fully-qualified name, e.g. `wso2.discovery.config.enforcer.JmsConnectionParameters`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Last segment of the qualified name.
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map_or(self.full_name.as_str(), |(_, name)| name)
    }

    /// Everything before the last segment; empty for unqualified names.
    pub fn package(&self) -> &str {
        self.full_name.rsplit_once('.').map_or("", |(pkg, _)| pkg)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Fields in ascending wire-number order.
    pub fn fields_by_number(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.by_number.iter().map(|&idx| &self.fields[idx])
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.by_number
            .binary_search_by_key(&number, |&idx| self.fields[idx].number)
            .ok()
            .map(|pos| &self.fields[self.by_number[pos]])
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    pub fn field_by_json_name(&self, json_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.json_name == json_name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Two descriptors are equal when they describe the same message: same
/// name and the same fields in the same declaration order.
impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name && self.fields == other.fields
    }
}

impl Eq for MessageDescriptor {}

impl fmt::Display for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "message {} {{", self.full_name)?;
        for field in &self.fields {
            writeln!(f, "  {field}")?;
        }
        f.write_str("}")
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `snake_case` → `lowerCamelCase`: drop underscores and upper-case the
/// letter that follows. Names already in camel case pass through.
fn to_json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
