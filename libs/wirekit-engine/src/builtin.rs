//! Schemas compiled into the binary and registered by `init_registry`.

use wirekit_api::error::WireError;
use wirekit_api::schema::{FieldDescriptor, MessageDescriptor, ScalarType};

pub const JMS_CONNECTION_PARAMETERS: &str =
    "wso2.discovery.config.enforcer.JmsConnectionParameters";

pub const EVENT_LISTENING_ENDPOINTS: &str = "eventListeningEndpoints";

/// Broker endpoints the enforcer subscribes to for control-plane events.
pub fn jms_connection_parameters() -> Result<MessageDescriptor, WireError> {
    MessageDescriptor::new(
        JMS_CONNECTION_PARAMETERS,
        vec![FieldDescriptor::repeated(
            EVENT_LISTENING_ENDPOINTS,
            1,
            ScalarType::String,
        )],
    )
}

/// Every built-in descriptor.
pub fn descriptors() -> Result<Vec<MessageDescriptor>, WireError> {
    Ok(vec![jms_connection_parameters()?])
}
