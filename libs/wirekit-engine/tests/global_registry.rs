//! The process-wide registry is initialized once per test binary, so every
//! assertion about it lives in this file.

use std::thread;

use wirekit_api::error::ErrorKind;
use wirekit_api::schema::{FieldDescriptor, MessageDescriptor, ScalarType};
use wirekit_engine::builtin::{self, JMS_CONNECTION_PARAMETERS};
use wirekit_engine::{global_registry, init_registry};

fn heartbeat(ty: ScalarType) -> MessageDescriptor {
    MessageDescriptor::new(
        "test.Heartbeat",
        vec![FieldDescriptor::optional("seq", 1, ty)],
    )
    .unwrap()
}

#[test]
fn init_once_then_sealed() {
    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| init_registry(vec![heartbeat(ScalarType::UInt64)]).unwrap()))
        .collect();
    let registries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for registry in &registries {
        assert!(std::ptr::eq(*registry, registries[0]));
    }

    let registry = global_registry().unwrap();
    assert!(std::ptr::eq(registry, registries[0]));
    assert!(registry.is_sealed());
    assert_eq!(
        registry.names(),
        vec![
            "test.Heartbeat".to_owned(),
            JMS_CONNECTION_PARAMETERS.to_owned()
        ]
    );

    let jms = registry.lookup(JMS_CONNECTION_PARAMETERS).unwrap();
    assert_eq!(*jms, builtin::jms_connection_parameters().unwrap());

    // Identical re-registration stays a no-op.
    assert!(init_registry(vec![heartbeat(ScalarType::UInt64)]).is_ok());
    assert!(registry.register(builtin::jms_connection_parameters().unwrap()).is_ok());

    let conflict = init_registry(vec![heartbeat(ScalarType::Int64)]).unwrap_err();
    assert_eq!(conflict.kind(), ErrorKind::SchemaConflict);

    let late = MessageDescriptor::new("test.Late", vec![]).unwrap();
    assert_eq!(init_registry(vec![late]).unwrap_err().kind(), ErrorKind::Sealed);
    assert_eq!(
        registry.lookup("test.Late").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}
