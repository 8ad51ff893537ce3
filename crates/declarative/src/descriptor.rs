//! Descriptor parsing and validation

use crate::error::{DescriptorError, InvalidResource, ValidationError};
use crate::planner::apply_order;
use crate::types::Resource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// On-disk shape of a descriptor file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorFile {
    #[serde(default, rename = "resource", alias = "resources")]
    resources: Vec<Resource>,
}

/// Descriptor file format, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Toml,
    Json,
}

impl DescriptorFormat {
    /// Detect the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// A validated, ordered set of resources.
///
/// Construction is the only validation point; a `Descriptor` always holds
/// resources that pass their invariants, have unique ids, and reference
/// only known dependencies without cycles.
#[derive(Debug, Clone)]
pub struct Descriptor {
    resources: Vec<Resource>,
    order: Vec<usize>,
}

impl Descriptor {
    /// Validate resources in declaration order.
    pub fn new(mut resources: Vec<Resource>) -> Result<Self, InvalidResource> {
        let invalid = |index: usize, resource: &Resource, error| InvalidResource {
            index,
            id: resource.display_id(),
            error,
        };

        let mut first_seen: HashMap<String, usize> = HashMap::new();
        for (index, resource) in resources.iter_mut().enumerate() {
            resource.normalize();
            let resource = &*resource;
            resource
                .validate()
                .map_err(|error| invalid(index, resource, error))?;

            if let Some(&first) = first_seen.get(resource.id()) {
                let error = ValidationError::DuplicateId {
                    id: resource.id().to_string(),
                    first,
                };
                return Err(invalid(index, resource, error));
            }
            first_seen.insert(resource.id().to_string(), index);
        }

        let order = apply_order(&resources)
            .map_err(|(index, error)| invalid(index, &resources[index], error))?;

        log::debug!("descriptor validated: {} resources", resources.len());
        Ok(Self { resources, order })
    }

    /// Parse and validate descriptor text.
    pub fn parse_str(content: &str, format: DescriptorFormat) -> Result<Self, DescriptorError> {
        let file: DescriptorFile = match format {
            DescriptorFormat::Toml => toml::from_str(content)?,
            DescriptorFormat::Json => serde_json::from_str(content)?,
        };
        Ok(Self::new(file.resources)?)
    }

    /// Load a descriptor file; the format follows the extension.
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        Self::load_with_content(path).map(|(descriptor, _)| descriptor)
    }

    /// Load a descriptor file and also return the text it was parsed from.
    pub fn load_with_content(path: &Path) -> Result<(Self, String), DescriptorError> {
        let format = DescriptorFormat::from_path(path)
            .ok_or_else(|| DescriptorError::UnsupportedFormat(path.to_path_buf()))?;
        let content = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: PathBuf::from(path),
            source,
        })?;
        let descriptor = Self::parse_str(&content, format)?;
        Ok((descriptor, content))
    }

    /// Resources in declaration order
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Declaration indices in apply order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if the descriptor declares nothing
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RepositoryResource;

    const OCAML_PRECISE: &str = include_str!("../../../demos/ocaml-precise.toml");

    #[test]
    fn test_parse_demo_descriptor() {
        let descriptor = Descriptor::parse_str(OCAML_PRECISE, DescriptorFormat::Toml).unwrap();
        let ids: Vec<String> = descriptor
            .order()
            .iter()
            .map(|&i| descriptor.resources()[i].display_id())
            .collect();
        assert_eq!(
            ids,
            vec![
                "package:python-software-properties",
                "repository:avsm-ppa-precise",
                "package:ocaml",
                "package:opam",
                "package:ocaml-native-compilers",
                "package:camlp4-extra",
                "package:m4",
            ]
        );
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "resource": [
                {"type": "repository", "id": "ppa", "uri": "http://ppa.launchpad.net/avsm/ppa/ubuntu",
                 "distribution": "precise", "components": ["main", "main"]},
                {"type": "package", "name": "m4"}
            ]
        }"#;
        let descriptor = Descriptor::parse_str(json, DescriptorFormat::Json).unwrap();
        assert_eq!(descriptor.len(), 2);
        let Resource::Repository(RepositoryResource { components, .. }) = &descriptor.resources()[0]
        else {
            panic!("expected repository");
        };
        assert_eq!(components, &vec!["main".to_string()]);
    }

    #[test]
    fn test_duplicate_repository_id() {
        let toml = r#"
[[resource]]
type = "repository"
id = "ppa"
uri = "http://a.example.com/ubuntu"
distribution = "precise"
components = ["main"]

[[resource]]
type = "repository"
id = "ppa"
uri = "http://b.example.com/ubuntu"
distribution = "precise"
components = ["main"]
"#;
        let err = Descriptor::parse_str(toml, DescriptorFormat::Toml).unwrap_err();
        let DescriptorError::Invalid(invalid) = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(invalid.index, 1);
        assert_eq!(
            invalid.error,
            ValidationError::DuplicateId {
                id: "ppa".to_string(),
                first: 0
            }
        );
    }

    #[test]
    fn test_malformed_version_is_located() {
        let toml = r#"
[[resource]]
type = "package"
name = "m4"

[[resource]]
type = "package"
name = "ocaml"
version = "4.01.0-"
"#;
        let err = Descriptor::parse_str(toml, DescriptorFormat::Toml).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid descriptor: resource[1] package:ocaml: malformed version '4.01.0-'"
        );
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let toml = "[[resource]]\ntype = \"package\"\nname = \"m4\"\nversoin = \"1\"\n";
        assert!(matches!(
            Descriptor::parse_str(toml, DescriptorFormat::Toml),
            Err(DescriptorError::Toml(_))
        ));
    }

    #[test]
    fn test_empty_descriptor_is_valid() {
        let descriptor = Descriptor::parse_str("", DescriptorFormat::Toml).unwrap();
        assert!(descriptor.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        std::fs::write(&path, OCAML_PRECISE).unwrap();
        assert_eq!(Descriptor::load(&path).unwrap().len(), 7);
        let (descriptor, content) = Descriptor::load_with_content(&path).unwrap();
        assert_eq!(descriptor.len(), 7);
        assert_eq!(content, OCAML_PRECISE);

        let yaml = dir.path().join("site.yaml");
        std::fs::write(&yaml, "resource: []").unwrap();
        assert!(matches!(
            Descriptor::load(&yaml),
            Err(DescriptorError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            Descriptor::load(&dir.path().join("missing.toml")),
            Err(DescriptorError::Io { .. })
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DescriptorFormat::from_path(Path::new("a/b.TOML")),
            Some(DescriptorFormat::Toml)
        );
        assert_eq!(
            DescriptorFormat::from_path(Path::new("b.json")),
            Some(DescriptorFormat::Json)
        );
        assert_eq!(DescriptorFormat::from_path(Path::new("b")), None);
    }
}
