//! Reflective access to message fields by name or wire number.
//!
//! Generic tooling (dumpers, converters, the CLI) works on any registered
//! message through these methods; there is no per-type accessor code.
//! Every write is checked against the field's declared type and
//! cardinality.

use std::sync::Arc;

use crate::error::WireError;
use crate::message::MessageInstance;
use crate::schema::{Cardinality, FieldDescriptor, MessageDescriptor, ScalarType};
use crate::value::{FieldValue, Value};

#[derive(Clone, Copy)]
struct Slot<'a> {
    name: &'a str,
    number: u32,
    cardinality: Cardinality,
    scalar_type: ScalarType,
}

impl<'a> From<&'a FieldDescriptor> for Slot<'a> {
    fn from(field: &'a FieldDescriptor) -> Self {
        Self {
            name: field.name(),
            number: field.number(),
            cardinality: field.cardinality(),
            scalar_type: field.scalar_type(),
        }
    }
}

impl Slot<'_> {
    fn check_value(&self, value: &Value) -> Result<(), WireError> {
        if self.scalar_type.accepts(value) {
            Ok(())
        } else {
            Err(WireError::type_mismatch(format!(
                "field '{}' expects {}, got {}",
                self.name,
                self.scalar_type,
                value.kind_name()
            )))
        }
    }

    fn check(&self, value: &FieldValue) -> Result<(), WireError> {
        match (self.cardinality, value) {
            (Cardinality::Optional, FieldValue::Single(v)) => self.check_value(v),
            (Cardinality::Repeated, FieldValue::List(values)) => {
                values.iter().try_for_each(|v| self.check_value(v))
            }
            (Cardinality::Optional, FieldValue::List(_)) => Err(WireError::type_mismatch(
                format!("field '{}' is optional, got a list", self.name),
            )),
            (Cardinality::Repeated, FieldValue::Single(_)) => Err(WireError::type_mismatch(
                format!("field '{}' is repeated, got a single value", self.name),
            )),
        }
    }
}

fn lookup<'d>(descriptor: &'d MessageDescriptor, name: &str) -> Result<&'d FieldDescriptor, WireError> {
    descriptor.field_by_name(name).ok_or_else(|| {
        WireError::not_found(format!(
            "message '{}' has no field '{name}'",
            descriptor.full_name()
        ))
    })
}

fn lookup_number(descriptor: &MessageDescriptor, number: u32) -> Result<&FieldDescriptor, WireError> {
    descriptor.field_by_number(number).ok_or_else(|| {
        WireError::not_found(format!(
            "message '{}' has no field number {number}",
            descriptor.full_name()
        ))
    })
}

impl MessageInstance {
    fn store(&mut self, number: u32, value: FieldValue) {
        let empty = match &value {
            FieldValue::Single(v) => v.is_default(),
            FieldValue::List(values) => values.is_empty(),
        };
        if empty {
            self.values.remove(&number);
        } else {
            self.values.insert(number, value);
        }
    }

    fn append(&mut self, number: u32, value: Value) {
        match self.values.get_mut(&number) {
            Some(FieldValue::List(values)) => values.push(value),
            _ => {
                self.values.insert(number, FieldValue::List(vec![value]));
            }
        }
    }

    /// Current value of a field, `None` when absent.
    ///
    /// Fails with `NotFound` for a name the descriptor does not declare.
    pub fn get(&self, name: &str) -> Result<Option<&FieldValue>, WireError> {
        let field = lookup(&self.descriptor, name)?;
        Ok(self.values.get(&field.number()))
    }

    pub fn get_by_number(&self, number: u32) -> Option<&FieldValue> {
        self.values.get(&number)
    }

    pub fn has(&self, name: &str) -> Result<bool, WireError> {
        Ok(self.get(name)?.is_some())
    }

    /// Replace a field's value.
    ///
    /// Optional fields take `FieldValue::Single`, repeated fields take
    /// `FieldValue::List`; any other shape or a value of the wrong kind
    /// fails with `TypeMismatch`. An optional field set to its zero value,
    /// or a repeated field set to an empty list, becomes absent.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), WireError> {
        let descriptor = Arc::clone(&self.descriptor);
        let slot = Slot::from(lookup(&descriptor, name)?);
        let value = value.into();
        slot.check(&value)?;
        self.store(slot.number, value);
        Ok(())
    }

    /// Append one element to a repeated field.
    pub fn push(&mut self, name: &str, value: impl Into<Value>) -> Result<(), WireError> {
        let descriptor = Arc::clone(&self.descriptor);
        let slot = Slot::from(lookup(&descriptor, name)?);
        if slot.cardinality != Cardinality::Repeated {
            return Err(WireError::type_mismatch(format!(
                "field '{name}' is optional, cannot push"
            )));
        }
        let value = value.into();
        slot.check_value(&value)?;
        self.append(slot.number, value);
        Ok(())
    }

    /// Merge one decoded value into the field with wire number `number`:
    /// repeated fields append, optional fields keep the last value seen.
    pub fn merge_by_number(&mut self, number: u32, value: Value) -> Result<(), WireError> {
        let descriptor = Arc::clone(&self.descriptor);
        let slot = Slot::from(lookup_number(&descriptor, number)?);
        slot.check_value(&value)?;
        match slot.cardinality {
            Cardinality::Repeated => self.append(number, value),
            Cardinality::Optional => self.store(number, FieldValue::Single(value)),
        }
        Ok(())
    }

    /// Make a field absent.
    pub fn clear(&mut self, name: &str) -> Result<(), WireError> {
        let number = lookup(&self.descriptor, name)?.number();
        self.values.remove(&number);
        Ok(())
    }

    /// Elements of a repeated string field; empty when absent.
    pub fn get_str_list(&self, name: &str) -> Result<Vec<&str>, WireError> {
        let field = lookup(&self.descriptor, name)?;
        if !field.is_repeated() || field.scalar_type() != ScalarType::String {
            return Err(WireError::type_mismatch(format!(
                "field '{name}' is {} {}, not repeated string",
                field.cardinality(),
                field.scalar_type()
            )));
        }
        Ok(self
            .values
            .get(&field.number())
            .map(|v| v.values().iter().filter_map(Value::as_str).collect())
            .unwrap_or_default())
    }
}

/// Read a field by name. See [`MessageInstance::get`].
pub fn get<'a>(
    instance: &'a MessageInstance,
    field_name: &str,
) -> Result<Option<&'a FieldValue>, WireError> {
    instance.get(field_name)
}

/// Write a field by name. See [`MessageInstance::set`].
pub fn set(
    instance: &mut MessageInstance,
    field_name: &str,
    value: FieldValue,
) -> Result<(), WireError> {
    instance.set(field_name, value)
}

/// Present fields with their descriptors, in wire-number order.
pub fn fields(
    instance: &MessageInstance,
) -> impl Iterator<Item = (&FieldDescriptor, &FieldValue)> + '_ {
    instance.present_fields()
}
