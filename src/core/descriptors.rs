//! Handler descriptors: the metadata shared by the query router and the stub
//! generator.
//!
//! A [`HandlerManifest`] is usually written by a preceding build step (or
//! exported from a live router with `QueryRouter::manifest`) and read back by
//! the generator:
//!
//! ```yaml
//! groups:
//!   - name: com.example.GreeterHandler
//!     route: /greeter
//!     operations:
//!       - name: hello
//!         route: /hello/{name}
//!         parameters:
//!           - { name: name, type: string }
//!         returns: string
//! types:
//!   - name: com.example.Person
//!     kind: struct
//!     fields:
//!       - { name: name, type: string }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

use crate::core::error::{Error, Result};
use crate::core::types::{self, TypeCatalog, TypeDeclaration, TypeRef};

/// A declared operation parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl ParameterDescriptor {
    pub fn new<S: Into<String>>(name: S, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One callable unit of a handler group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub name: String,
    /// Route suffix appended to the group prefix
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default = "void_type")]
    pub returns: TypeRef,
}

fn void_type() -> TypeRef {
    TypeRef::Void
}

impl OperationDescriptor {
    pub fn new<S: Into<String>, R: Into<String>>(name: S, route: R) -> Self {
        Self {
            name: name.into(),
            route: route.into(),
            parameters: Vec::new(),
            returns: TypeRef::Void,
        }
    }

    pub fn param<S: Into<String>>(mut self, name: S, ty: TypeRef) -> Self {
        self.parameters.push(ParameterDescriptor::new(name, ty));
        self
    }

    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.returns = ty;
        self
    }

    /// Every type this operation mentions, return type first
    pub fn types(&self) -> impl Iterator<Item = &TypeRef> {
        std::iter::once(&self.returns).chain(self.parameters.iter().map(|p| &p.ty))
    }
}

/// A named collection of operations sharing a route prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerGroupDescriptor {
    /// Qualified name, e.g. `com.example.GreeterHandler`
    pub name: String,
    #[serde(default)]
    pub route: String,
    /// Explicit output directory for the generated service stub
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub operations: Vec<OperationDescriptor>,
}

impl HandlerGroupDescriptor {
    pub fn new<S: Into<String>, R: Into<String>>(name: S, route: R) -> Self {
        Self {
            name: name.into(),
            route: route.into(),
            path: None,
            operations: Vec::new(),
        }
    }

    pub fn simple_name(&self) -> &str {
        types::simple_name(&self.name)
    }

    pub fn namespace(&self) -> &str {
        types::namespace(&self.name)
    }
}

/// Everything the generator needs to know about the handlers of an application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerManifest {
    #[serde(default)]
    pub groups: Vec<HandlerGroupDescriptor>,
    /// Declarations of every enum and complex type referenced by name
    #[serde(default)]
    pub types: Vec<TypeDeclaration>,
    /// Additional root types that get artifacts even when no operation uses them
    #[serde(default)]
    pub dtos: Vec<String>,
}

impl HandlerManifest {
    /// Load a manifest from a JSON or YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;

        let manifest = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_yaml(&content)?,
        };
        tracing::debug!(
            path = %path.display(),
            groups = manifest.groups.len(),
            types = manifest.types.len(),
            "Loaded handler manifest"
        );
        Ok(manifest)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// YAML is a superset of JSON, so this accepts both
    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Rejects duplicate declarations and unnamed groups or operations
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for declaration in &self.types {
            if !seen.insert(declaration.name.as_str()) {
                return Err(Error::manifest(format!(
                    "type '{}' is declared more than once",
                    declaration.name
                )));
            }
        }

        for group in &self.groups {
            if group.name.trim().is_empty() {
                return Err(Error::manifest("handler group without a name"));
            }
            if let Some(op) = group.operations.iter().find(|op| op.name.trim().is_empty()) {
                return Err(Error::manifest(format!(
                    "operation with route '{}' in '{}' has no name",
                    op.route, group.name
                )));
            }
        }
        Ok(())
    }

    pub fn catalog(&self) -> TypeCatalog {
        self.types.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PrimitiveKind;
    use tempfile::TempDir;

    const GREETER: &str = r#"
groups:
  - name: com.example.GreeterHandler
    route: /greeter
    operations:
      - name: hello
        route: /hello/{name}
        parameters:
          - { name: name, type: string }
        returns: string
      - name: ping
types:
  - name: com.example.Person
    kind: struct
    fields:
      - { name: name, type: string }
"#;

    #[test]
    fn test_from_yaml() {
        let manifest = HandlerManifest::from_yaml(GREETER).unwrap();
        assert_eq!(manifest.groups.len(), 1);

        let group = &manifest.groups[0];
        assert_eq!(group.simple_name(), "GreeterHandler");
        assert_eq!(group.namespace(), "com.example");
        assert_eq!(group.operations[0].returns, TypeRef::String);

        let ping = &group.operations[1];
        assert_eq!(ping.route, "");
        assert!(ping.returns.is_void());
        assert!(ping.parameters.is_empty());

        assert!(manifest.catalog().contains("com.example.Person"));
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let yaml = r#"
types:
  - { name: a.B, kind: enum, values: [X] }
  - { name: a.B, kind: enum, values: [Y] }
"#;
        let err = HandlerManifest::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("a.B"));
    }

    #[test]
    fn test_invalid_type_expression_rejected() {
        let yaml = r#"
groups:
  - name: a.Handler
    operations:
      - { name: op, returns: "list<int" }
"#;
        assert!(HandlerManifest::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_operation_builder() {
        let op = OperationDescriptor::new("double", "/double/{value}")
            .param("value", TypeRef::Primitive(PrimitiveKind::Int))
            .returns(TypeRef::Primitive(PrimitiveKind::Int));
        let types: Vec<_> = op.types().collect();
        assert_eq!(types.len(), 2);
    }

    #[tokio::test]
    async fn test_from_file_json_and_yaml() {
        let dir = TempDir::new().unwrap();
        let manifest = HandlerManifest::from_yaml(GREETER).unwrap();

        let yaml_path = dir.path().join("handlers.yaml");
        tokio::fs::write(&yaml_path, manifest.to_yaml().unwrap())
            .await
            .unwrap();
        let loaded = HandlerManifest::from_file(&yaml_path).await.unwrap();
        assert_eq!(loaded, manifest);

        let json_path = dir.path().join("handlers.json");
        tokio::fs::write(&json_path, serde_json::to_string(&manifest).unwrap())
            .await
            .unwrap();
        let loaded = HandlerManifest::from_file(&json_path).await.unwrap();
        assert_eq!(loaded, manifest);
    }

    #[tokio::test]
    async fn test_from_file_missing() {
        let err = HandlerManifest::from_file("/nonexistent/handlers.yaml")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
