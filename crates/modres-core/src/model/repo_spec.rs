use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Rule class used for modules materialized from a local directory
pub const LOCAL_REPOSITORY: &str = "local_repository";

/// Scalar attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// Attribute value of a repository rule: a scalar or a list of scalars
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Scalar(Scalar::Str(s.to_string()))
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Scalar(Scalar::Str(s))
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Scalar(Scalar::Int(n))
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Scalar(Scalar::Bool(b))
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(items: Vec<String>) -> Self {
        AttrValue::List(items.into_iter().map(Scalar::Str).collect())
    }
}

impl From<&[&str]> for AttrValue {
    fn from(items: &[&str]) -> Self {
        AttrValue::List(items.iter().map(|s| Scalar::Str(s.to_string())).collect())
    }
}

/// The rule needed to materialize one external repository
///
/// Attributes keep the order they were declared in. Equality ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSpec {
    pub rule_class: String,
    #[serde(default)]
    pub attributes: IndexMap<String, AttrValue>,
}

impl RepoSpec {
    pub fn new(rule_class: impl Into<String>) -> Self {
        Self {
            rule_class: rule_class.into(),
            attributes: IndexMap::new(),
        }
    }

    /// `local_repository` pointing at `path`
    pub fn local_repository(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(LOCAL_REPOSITORY)
            .with_attr("name", name.into())
            .with_attr("path", path.into())
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// The `name` attribute, when it is a string
    pub fn name(&self) -> Option<&str> {
        match self.attributes.get("name") {
            Some(AttrValue::Scalar(Scalar::Str(name))) => Some(name),
            _ => None,
        }
    }
}
