use std::path::Path;

use serde::Deserialize;

use wirekit_api::schema::{Cardinality, FieldDescriptor, MessageDescriptor, ScalarType};

use crate::error::EngineError;

/// Root of a schema definition file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    #[serde(default)]
    pub messages: Vec<MessageConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageConfig {
    /// Fully-qualified name, dot-separated.
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub name: String,
    pub number: u32,
    #[serde(rename = "type")]
    pub scalar_type: ScalarType,
    #[serde(default)]
    pub label: Cardinality,
    /// Defaults to the lowerCamelCase form of `name`.
    #[serde(default)]
    pub json_name: Option<String>,
}

/// Parser for one schema file syntax, picked by file extension.
pub trait ConfigParser: Send + Sync {
    fn extensions(&self) -> &[&str];

    fn parse(&self, content: &str) -> Result<SchemaConfig, EngineError>;
}

pub struct TomlParser;

impl ConfigParser for TomlParser {
    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn parse(&self, content: &str) -> Result<SchemaConfig, EngineError> {
        toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }
}

impl SchemaConfig {
    /// Load a TOML schema file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::load_with(path, &[&TomlParser])
    }

    /// Load a schema file with the first parser claiming its extension.
    pub fn load_with(
        path: impl AsRef<Path>,
        parsers: &[&dyn ConfigParser],
    ) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let parser = parsers
            .iter()
            .find(|p| p.extensions().contains(&ext))
            .ok_or_else(|| {
                EngineError::Config(format!(
                    "{}: no parser for extension '{ext}'",
                    path.display()
                ))
            })?;

        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        let config = parser
            .parse(&content)
            .map_err(|e| e.with_context(path.display()))?;

        tracing::info!(
            path = %path.display(),
            messages = config.messages.len(),
            "loaded schema file"
        );
        Ok(config)
    }

    /// Parse a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        TomlParser.parse(toml_str)
    }

    /// Validate and build every declared message.
    pub fn descriptors(&self) -> Result<Vec<MessageDescriptor>, EngineError> {
        self.messages.iter().map(MessageConfig::descriptor).collect()
    }
}

impl MessageConfig {
    pub fn descriptor(&self) -> Result<MessageDescriptor, EngineError> {
        let fields = self
            .fields
            .iter()
            .map(|f| {
                let field = FieldDescriptor::new(&f.name, f.number, f.label, f.scalar_type);
                match &f.json_name {
                    Some(json_name) => field.with_json_name(json_name),
                    None => field,
                }
            })
            .collect();
        Ok(MessageDescriptor::new(&self.name, fields)?)
    }
}

/// Load every file in `paths` and collect their descriptors in order.
pub fn load_all<P: AsRef<Path>>(
    paths: &[P],
    parsers: &[&dyn ConfigParser],
) -> Result<Vec<MessageDescriptor>, EngineError> {
    let mut out = Vec::new();
    for path in paths {
        let config = SchemaConfig::load_with(path, parsers)?;
        let descriptors = config
            .descriptors()
            .map_err(|e| e.with_context(path.as_ref().display()))?;
        out.extend(descriptors);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    const JMS: &str = r#"
[[messages]]
name = "wso2.discovery.config.enforcer.JmsConnectionParameters"

[[messages.fields]]
name = "eventListeningEndpoints"
number = 1
type = "string"
label = "repeated"
"#;

    #[test]
    fn parses_field_defaults() {
        let config = SchemaConfig::parse(
            r#"
[[messages]]
name = "test.Port"
[[messages.fields]]
name = "port_number"
number = 2
type = "uint32"
"#,
        )
        .unwrap();
        let field = &config.messages[0].fields[0];
        assert_eq!(field.label, Cardinality::Optional);
        assert_eq!(field.scalar_type, ScalarType::UInt32);
        assert_eq!(field.json_name, None);

        let desc = config.descriptors().unwrap();
        assert_eq!(desc[0].fields()[0].json_name(), "portNumber");
    }

    #[test]
    fn toml_matches_builtin() {
        let desc = SchemaConfig::parse(JMS).unwrap().descriptors().unwrap();
        assert_eq!(desc, vec![builtin::jms_connection_parameters().unwrap()]);
    }

    #[test]
    fn unknown_type_is_config_error() {
        let err = SchemaConfig::parse(
            r#"
[[messages]]
name = "test.X"
[[messages.fields]]
name = "x"
number = 1
type = "varchar"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn invalid_descriptor_surfaces_wire_error() {
        let config = SchemaConfig::parse(
            r#"
[[messages]]
name = "test.Dup"
[[messages.fields]]
name = "a"
number = 1
type = "bool"
[[messages.fields]]
name = "b"
number = 1
type = "bool"
"#,
        )
        .unwrap();
        let err = config.descriptors().unwrap_err();
        assert_eq!(
            err.wire_kind(),
            Some(wirekit_api::error::ErrorKind::InvalidSchema)
        );
    }
}
