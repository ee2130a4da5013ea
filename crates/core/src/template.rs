//! The generated resource graph.
//!
//! Resources are kept in a strongly-typed table: a [`ResourceKind`] sum
//! type paired with its property tree. Property trees are
//! `serde_json::Value`, the tagged scalar/array/mapping recursion user
//! overrides are merged into. BTreeMap-backed maps keep serialization
//! deterministic.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::{Map, Value, json};

use crate::merge::deep_merge;

/// Kinds of resources the compiler can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Bucket,
    OriginAccessIdentity,
    CachePolicy,
    Distribution,
    RequestFunction,
    ResponseFunction,
}

impl ResourceKind {
    /// The CloudFormation type string emitted for this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::Bucket => "AWS::S3::Bucket",
            ResourceKind::OriginAccessIdentity => {
                "AWS::CloudFront::CloudFrontOriginAccessIdentity"
            }
            ResourceKind::CachePolicy => "AWS::CloudFront::CachePolicy",
            ResourceKind::Distribution => "AWS::CloudFront::Distribution",
            ResourceKind::RequestFunction | ResourceKind::ResponseFunction => {
                "AWS::CloudFront::Function"
            }
        }
    }
}

/// One generated resource: its kind plus the property tree.
#[derive(Debug, Clone)]
pub struct Resource {
    pub kind: ResourceKind,
    /// The `Properties` subtree.
    pub properties: Value,
    /// Resource-level attributes other than `Properties` set through
    /// extensions (e.g. `DeletionPolicy`, or a replaced `Type`).
    pub attributes: Map<String, Value>,
}

impl Resource {
    pub fn new(kind: ResourceKind, properties: Value) -> Self {
        Self {
            kind,
            properties,
            attributes: Map::new(),
        }
    }

    /// Apply a user extension tree to this resource definition.
    ///
    /// The extension's `Properties` subtree is deep-merged into the
    /// generated properties; any other key lands on the resource node
    /// itself, replacing what the generator emitted there.
    pub fn apply_extension(&mut self, extension: &Value) {
        let Value::Object(entries) = extension else {
            tracing::warn!("extension tree is not a mapping; ignoring");
            return;
        };
        for (key, value) in entries {
            if key == "Properties" {
                deep_merge(&mut self.properties, value);
            } else {
                self.attributes.insert(key.clone(), value.clone());
            }
        }
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self.attributes.get("Type") {
            Some(replaced) => map.serialize_entry("Type", replaced)?,
            None => map.serialize_entry("Type", self.kind.type_name())?,
        }
        map.serialize_entry("Properties", &self.properties)?;
        for (key, value) in &self.attributes {
            if key != "Type" {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// A named template output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Value")]
    pub value: Value,
}

/// The full generated template: resources plus named outputs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Template {
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs")]
    pub outputs: BTreeMap<String, Output>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_resource(&mut self, id: impl Into<String>, resource: Resource) {
        self.resources.insert(id.into(), resource);
    }

    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        value: Value,
    ) {
        self.outputs.insert(
            name.into(),
            Output {
                description: description.into(),
                value,
            },
        );
    }

    /// Fold another construct's template into this one. Ids are
    /// construct-prefixed, so distinct constructs never collide.
    pub fn absorb(&mut self, other: Template) {
        self.resources.extend(other.resources);
        self.outputs.extend(other.outputs);
    }
}

/// The `Fn::GetAtt` intrinsic.
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// The `Ref` intrinsic.
pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}
