use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::schema::{FieldDescriptor, MessageDescriptor};
use crate::value::FieldValue;

/// Raw bytes of fields the descriptor does not declare, kept verbatim
/// (tag + payload, in the order read) so re-encoding reproduces them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownFields(Vec<u8>);

impl UnknownFields {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append one raw tag + payload record.
    pub fn push_raw(&mut self, raw: &[u8]) {
        self.0.extend_from_slice(raw);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// A value conforming to a `MessageDescriptor`.
///
/// Values are keyed by wire number, so iteration is already in canonical
/// encoding order. An absent field has no entry; a repeated field never
/// holds an empty list. Mutation goes through the accessor methods in
/// `reflect`, which enforce the descriptor's types.
#[derive(Debug, Clone)]
pub struct MessageInstance {
    pub(crate) descriptor: Arc<MessageDescriptor>,
    pub(crate) values: BTreeMap<u32, FieldValue>,
    pub(crate) unknown: UnknownFields,
}

impl MessageInstance {
    /// Empty instance: every field absent.
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        Self {
            descriptor,
            values: BTreeMap::new(),
            unknown: UnknownFields::default(),
        }
    }

    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    pub fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    pub fn unknown_fields_mut(&mut self) -> &mut UnknownFields {
        &mut self.unknown
    }

    /// Present fields in ascending wire-number order.
    pub fn present_fields(&self) -> impl Iterator<Item = (&FieldDescriptor, &FieldValue)> + '_ {
        self.values.iter().filter_map(|(number, value)| {
            self.descriptor
                .field_by_number(*number)
                .map(|field| (field, value))
        })
    }

    /// No declared field present and no unknown bytes.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.unknown.is_empty()
    }

    /// Drop every value, including unknown fields.
    pub fn reset(&mut self) {
        self.values.clear();
        self.unknown.clear();
    }
}

impl PartialEq for MessageInstance {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.descriptor, &other.descriptor) || self.descriptor == other.descriptor)
            && self.values == other.values
            && self.unknown == other.unknown
    }
}

/// Compact text form: `name:value` pairs in wire order, one pair per
/// repeated element.
impl fmt::Display for MessageInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, value) in self.present_fields() {
            for v in value.values() {
                if !first {
                    f.write_str(" ")?;
                }
                first = false;
                write!(f, "{}:{v}", field.name())?;
            }
        }
        if !self.unknown.is_empty() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "<unknown {} bytes>", self.unknown.len())?;
        }
        Ok(())
    }
}
