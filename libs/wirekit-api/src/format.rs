use std::sync::Arc;

use crate::error::WireError;
use crate::message::MessageInstance;
use crate::schema::MessageDescriptor;

/// Runtime serializer: performs `bytes ↔ MessageInstance` for one
/// representation of a message.
///
/// - `deserialize()` parses bytes against `descriptor`.
/// - `serialize()` renders an instance back to bytes.
pub trait FormatSerializer: Send + Sync {
    /// Short name (`"binary"`, `"json"`), used in logs and CLI flags.
    fn name(&self) -> &'static str;

    fn deserialize(
        &self,
        bytes: &[u8],
        descriptor: &Arc<MessageDescriptor>,
    ) -> Result<MessageInstance, WireError>;

    fn serialize(&self, instance: &MessageInstance) -> Result<Vec<u8>, WireError>;
}
