//! Provider records as supplied by the catalogue loader.

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Capability tag for high value asset assessments.
pub const HVA: &str = "HVA";

/// Capability tag for moderate impact assessments.
pub const MEDIUM: &str = "Medium";

/// One catalogue entry: a cloud provider or SaaS vendor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRecord {
    /// Display name, unique within one catalogue
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Provider category
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub provider_type: ProviderType,

    /// Platforms this provider runs on
    #[serde(default, rename = "underlyingCSP", deserialize_with = "string_list")]
    pub underlying_csp: Vec<String>,

    /// Assessed services keyed by name, in source order
    #[serde(default, deserialize_with = "null_as_default")]
    pub services_in_scope: ServicesInScope,

    /// Links to assessment material
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<References>,
}

impl ProviderRecord {
    /// Creates a record with a name and type and nothing else.
    pub fn new(name: impl Into<String>, provider_type: impl Into<ProviderType>) -> Self {
        Self {
            name: name.into(),
            provider_type: provider_type.into(),
            ..Self::default()
        }
    }

    /// Adds an underlying platform.
    pub fn with_underlying(mut self, csp: impl Into<String>) -> Self {
        self.underlying_csp.push(csp.into());
        self
    }

    /// Adds a service with its capability tags.
    pub fn with_service<I, S>(mut self, title: impl Into<String>, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services_in_scope
            .insert(title.into(), levels.into_iter().map(Into::into).collect());
        self
    }

    /// Number of services in scope.
    pub fn service_count(&self) -> usize {
        self.services_in_scope.len()
    }

    /// Number of services assessed at the HVA level.
    pub fn hva_service_count(&self) -> usize {
        self.services_in_scope
            .iter()
            .filter(|(_, levels)| levels.iter().any(|l| l == HVA))
            .count()
    }
}

/// Provider category. Unknown categories are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderType {
    /// Cloud service provider
    Csp,
    /// Software-as-a-service vendor
    Saas,
    /// Anything else, including the empty string
    Other(String),
}

impl ProviderType {
    /// The tag as it appears in catalogue data.
    pub fn as_str(&self) -> &str {
        match self {
            ProviderType::Csp => "CSP",
            ProviderType::Saas => "SaaS",
            ProviderType::Other(s) => s,
        }
    }
}

impl Default for ProviderType {
    fn default() -> Self {
        ProviderType::Other(String::new())
    }
}

impl From<String> for ProviderType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "CSP" => ProviderType::Csp,
            "SaaS" => ProviderType::Saas,
            _ => ProviderType::Other(s),
        }
    }
}

impl From<&str> for ProviderType {
    fn from(s: &str) -> Self {
        ProviderType::from(s.to_string())
    }
}

impl From<ProviderType> for String {
    fn from(t: ProviderType) -> Self {
        match t {
            ProviderType::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Services in scope, kept in the order they appear in the source data.
///
/// Serialized as a JSON object mapping service name to capability tags.
/// A repeated key replaces the earlier value in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServicesInScope(Vec<(String, Vec<String>)>);

impl ServicesInScope {
    /// Inserts or replaces a service.
    pub fn insert(&mut self, title: String, levels: Vec<String>) {
        match self.0.iter_mut().find(|(t, _)| *t == title) {
            Some(slot) => slot.1 = levels,
            None => self.0.push((title, levels)),
        }
    }

    /// Capability tags for a service.
    pub fn get(&self, title: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, levels)| levels.as_slice())
    }

    /// Iterates services in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(t, l)| (t.as_str(), l.as_slice()))
    }

    /// Service names in source order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ServicesInScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (title, levels) in &self.0 {
            map.serialize_entry(title, levels)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ServicesInScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ServicesVisitor;

        impl<'de> Visitor<'de> for ServicesVisitor {
            type Value = ServicesInScope;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of service name to capability levels")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut services = ServicesInScope::default();
                while let Some((title, levels)) = access.next_entry::<String, StringList>()? {
                    services.insert(title, levels.0);
                }
                Ok(services)
            }
        }

        deserializer.deserialize_map(ServicesVisitor)
    }
}

/// Links to assessment material for a provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct References {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_report: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_reference: Option<OneOrMany>,
}

impl References {
    /// Provider reference links, whether given as one string or a list.
    pub fn provider_links(&self) -> Vec<&str> {
        match &self.provider_reference {
            Some(OneOrMany::One(link)) => vec![link.as_str()],
            Some(OneOrMany::Many(links)) => links.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }
}

/// A single value or a list of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// A list of strings that tolerates `null` and stray non-string elements.
struct StringList(Vec<String>);

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Item {
            Text(String),
            Other(IgnoredAny),
        }

        let items = Option::<Vec<Item>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(StringList(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Item::Text(s) => Some(s),
                    Item::Other(_) => None,
                })
                .collect(),
        ))
    }
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    StringList::deserialize(deserializer).map(|list| list.0)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
