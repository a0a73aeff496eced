pub mod error;
pub mod format;
pub mod message;
pub mod reflect;
pub mod schema;
pub mod value;

pub use error::{ErrorKind, WireError};
pub use message::{MessageInstance, UnknownFields};
pub use schema::{Cardinality, FieldDescriptor, MessageDescriptor, ScalarType, WireType};
pub use value::{FieldValue, Value};
