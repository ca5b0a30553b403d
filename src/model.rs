//! Resolved documentation model handed to the renderer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which provider registry a resource was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Datasource,
    Resource,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Datasource => "datasource",
            ResourceType::Resource => "resource",
        }
    }

    /// Directory used for pages of this type (`d` or `r`).
    pub fn dir(&self) -> &'static str {
        &self.as_str()[..1]
    }

    /// Heading label used in rendered pages.
    pub fn title(&self) -> &'static str {
        match self {
            ResourceType::Datasource => "Data Source",
            ResourceType::Resource => "Resource",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A documented resource or data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Provider name, e.g. `azurerm`.
    pub provider: String,
    /// Public name, e.g. `azurerm_image`.
    pub name: String,
    /// Name without the provider prefix, e.g. `image`.
    pub name_suffix: String,
    pub short_description: String,
    pub description: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Top-level attributes, sorted by name.
    pub attributes: Vec<Attribute>,
}

impl Resource {
    /// Look up an attribute by dotted path (`os_disk.caching`).
    pub fn attribute(&self, path: &str) -> Option<&Attribute> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.attributes.iter().find(|a| a.name == first)?;
        for segment in segments {
            current = current.attributes.iter().find(|a| a.name == segment)?;
        }
        Some(current)
    }
}

/// One schema field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    /// Nested fields of a composite schema, sorted by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    /// `MinItems` of the field schema, 0 when unset.
    pub min: i64,
    /// `MaxItems` of the field schema, 0 when unset.
    pub max: i64,
}

impl Attribute {
    /// Whether the attribute is user-settable (an argument) rather than
    /// only exported by the provider.
    pub fn is_argument(&self) -> bool {
        self.required || self.optional
    }

    pub fn is_block(&self) -> bool {
        !self.attributes.is_empty()
    }
}

/// Sort attributes by name, the order every level of the model is kept in.
pub fn sort_attributes(attributes: &mut [Attribute]) {
    attributes.sort_by(|a, b| a.name.cmp(&b.name));
}
