// used to validate names that end up as SQL identifiers
use regex::Regex;
use lazy_static::lazy_static;
use serde_json::Value;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::datatype::{ArrayOf, AttrValue, AttributeType};
use crate::error::{DocattrError, Result};

/// The document column attributes go to unless told otherwise.
pub const DEFAULT_CONTAINER: &str = "json_attributes";

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

pub(crate) fn validate_identifier(kind: &str, candidate: &str) -> Result<()> {
    if IDENTIFIER.is_match(candidate) {
        Ok(())
    } else {
        Err(DocattrError::InvalidIdentifier(format!("{} '{}'", kind, candidate)))
    }
}

/// Declaration options for an attribute.
///
/// ```
/// use docattr::definition::AttributeOptions;
/// let options = AttributeOptions::new().store_key("st").default("draft");
/// assert_eq!(options.store_key_ref(), Some("st"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AttributeOptions {
    store_key: Option<String>,
    default: Option<AttrValue>,
    array: bool,
    extra: BTreeMap<String, Value>,
}

impl AttributeOptions {
    pub fn new() -> Self {
        <Self as Default>::default()
    }
    /// Store under a different key than the attribute name.
    pub fn store_key(mut self, key: impl Into<String>) -> Self {
        self.store_key = Some(key.into());
        self
    }
    /// Returned by the getter while nothing is stored under the key.
    pub fn default(mut self, value: impl Into<AttrValue>) -> Self {
        self.default = Some(value.into());
        self
    }
    /// Wrap the declared type in an array of that type.
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }
    /// Anything else the host wants to hang on the definition.
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
    pub fn store_key_ref(&self) -> Option<&str> {
        self.store_key.as_deref()
    }
    pub fn is_array(&self) -> bool {
        self.array
    }
    pub fn extras(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }
}

/// Binds a logical attribute name to its type and its place in a document.
#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    name: String,
    attr_type: Arc<dyn AttributeType>,
    store_key: String,
    container: String,
    default: Option<AttrValue>,
    options: AttributeOptions,
}

impl AttributeDefinition {
    pub fn new(
        name: impl Into<String>,
        attr_type: Arc<dyn AttributeType>,
        container: impl Into<String>,
        options: AttributeOptions,
    ) -> Result<Self> {
        let name = name.into();
        let container = container.into();
        validate_identifier("attribute name", &name)?;
        validate_identifier("container", &container)?;
        let store_key = options.store_key.clone().unwrap_or_else(|| name.clone());
        if store_key.is_empty() {
            return Err(DocattrError::InvalidIdentifier(format!("empty store key for '{}'", name)));
        }
        let attr_type: Arc<dyn AttributeType> = if options.array {
            Arc::new(ArrayOf::new(attr_type))
        } else {
            attr_type
        };
        // defaults are cast up front so a bad one fails at declaration
        let default = match &options.default {
            Some(raw) => Some(attr_type.cast(raw)?),
            None => None,
        };
        Ok(Self {
            name,
            attr_type,
            store_key,
            container,
            default,
            options,
        })
    }
    // Everything is exposed through getters only, so a definition
    // cannot change after it has been constructed.
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn attr_type(&self) -> &Arc<dyn AttributeType> {
        &self.attr_type
    }
    pub fn store_key(&self) -> &str {
        &self.store_key
    }
    pub fn container(&self) -> &str {
        &self.container
    }
    pub fn default_value(&self) -> Option<&AttrValue> {
        self.default.as_ref()
    }
    pub fn options(&self) -> &AttributeOptions {
        &self.options
    }
    pub fn cast(&self, raw: &AttrValue) -> Result<AttrValue> {
        self.attr_type.cast(raw)
    }
    pub fn serialize(&self, value: &AttrValue) -> Result<Value> {
        self.attr_type.serialize(value)
    }
    pub fn deserialize(&self, value: &Value) -> Result<AttrValue> {
        self.attr_type.deserialize(value)
    }
    /// `serialize(cast(raw))`, the exact form written by setters and
    /// matched by containment queries.
    pub fn encode(&self, raw: &AttrValue) -> Result<Value> {
        self.serialize(&self.cast(raw)?)
    }
}

impl fmt::Display for AttributeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}.{}",
            self.name,
            self.attr_type.type_name(),
            self.container,
            self.store_key
        )
    }
}
