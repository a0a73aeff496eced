pub mod builtin;
pub mod codec;
pub mod config;
pub mod error;
pub mod registry;
pub mod wire;

pub use codec::{decode, encode, encode_to, encoded_len, BinaryFormat};
pub use registry::{global_registry, init_registry, SchemaRegistry};
