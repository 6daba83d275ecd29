use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::Arc;

// we will use a fast hashing algo for the name lookups
use seahash::SeaHasher;
use tracing::{debug, warn};

use crate::datatype::AttributeType;
use crate::definition::{AttributeDefinition, AttributeOptions};
use crate::error::{DocattrError, Result};

pub type NameHasher = BuildHasherDefault<SeaHasher>;

/// Attribute name to definition, for one record type.
///
/// Cloning is how inheritance works: a subtype starts from a clone of its
/// parent's registry and extends that, leaving the parent untouched. The
/// definitions themselves are shared through `Arc` since they never change.
#[derive(Debug, Clone)]
pub struct AttributeRegistry {
    record_type: String,
    default_container: String,
    definitions: HashMap<String, Arc<AttributeDefinition>, NameHasher>,
    // declaration order, for listing
    order: Vec<String>,
}

impl AttributeRegistry {
    pub fn new(record_type: impl Into<String>, default_container: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            default_container: default_container.into(),
            definitions: HashMap::default(),
            order: Vec::new(),
        }
    }
    /// A copy owned by `record_type`, carrying every declaration made so far.
    pub fn inherit(&self, record_type: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.record_type = record_type.into();
        copy
    }
    pub fn record_type(&self) -> &str {
        &self.record_type
    }
    pub fn default_container(&self) -> &str {
        &self.default_container
    }
    pub(crate) fn set_default_container(&mut self, container: impl Into<String>) {
        self.default_container = container.into();
    }

    /// Declares `name` in the default container.
    pub fn declare(
        &mut self,
        name: &str,
        attr_type: Arc<dyn AttributeType>,
        options: AttributeOptions,
    ) -> Result<Arc<AttributeDefinition>> {
        let container = self.default_container.clone();
        self.declare_in(name, attr_type, &container, options)
    }

    /// Declares `name` in `container`. A later declaration of the same name
    /// replaces the earlier one; a different name already stored under the
    /// same container and key is a conflict.
    pub fn declare_in(
        &mut self,
        name: &str,
        attr_type: Arc<dyn AttributeType>,
        container: &str,
        options: AttributeOptions,
    ) -> Result<Arc<AttributeDefinition>> {
        let definition = AttributeDefinition::new(name, attr_type, container, options)?;
        if let Some(existing) = self.definitions.values().find(|d| {
            d.name() != definition.name()
                && d.container() == definition.container()
                && d.store_key() == definition.store_key()
        }) {
            return Err(DocattrError::ConfigurationConflict {
                record_type: self.record_type.clone(),
                container: definition.container().to_string(),
                store_key: definition.store_key().to_string(),
                existing: existing.name().to_string(),
                attempted: definition.name().to_string(),
            });
        }
        let definition = Arc::new(definition);
        match self.definitions.insert(name.to_string(), Arc::clone(&definition)) {
            Some(previous) => {
                warn!(
                    record_type = %self.record_type,
                    attribute = name,
                    previous = %previous,
                    current = %definition,
                    "attribute redeclared"
                );
            }
            None => {
                self.order.push(name.to_string());
                debug!(record_type = %self.record_type, attribute = %definition, "attribute declared");
            }
        }
        Ok(definition)
    }

    pub fn lookup(&self, name: &str) -> Result<&Arc<AttributeDefinition>> {
        self.definitions
            .get(name)
            .ok_or_else(|| DocattrError::UnknownAttribute {
                record_type: self.record_type.clone(),
                name: name.to_string(),
            })
    }
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }
    /// Definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<AttributeDefinition>> {
        self.order.iter().filter_map(|name| self.definitions.get(name))
    }
    /// Every container some attribute is routed to, in first-declared order.
    pub fn containers(&self) -> Vec<&str> {
        let mut containers: Vec<&str> = Vec::new();
        for definition in self.iter() {
            if !containers.contains(&definition.container()) {
                containers.push(definition.container());
            }
        }
        containers
    }
    pub fn len(&self) -> usize {
        self.definitions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::{AttrValue, IntegerType, StringType};
    use crate::definition::DEFAULT_CONTAINER;

    fn registry() -> AttributeRegistry {
        AttributeRegistry::new("Widget", DEFAULT_CONTAINER)
    }

    #[test]
    fn lookup_of_undeclared_name_fails() {
        let reg = registry();
        let err = reg.lookup("color").unwrap_err();
        assert!(matches!(err, DocattrError::UnknownAttribute { ref name, .. } if name == "color"));
        assert!(format!("{}", err).contains("Widget"));
    }

    #[test]
    fn last_declaration_wins() {
        let mut reg = registry();
        reg.declare("size", Arc::new(StringType), AttributeOptions::new()).unwrap();
        reg.declare("size", Arc::new(IntegerType), AttributeOptions::new()).unwrap();
        let def = reg.lookup("size").unwrap();
        assert_eq!(def.attr_type().type_name(), "integer");
        assert_eq!(def.cast(&"4".into()).unwrap(), AttrValue::Integer(4));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn store_key_collision_is_a_conflict() {
        let mut reg = registry();
        reg.declare("status", Arc::new(StringType), AttributeOptions::new()).unwrap();
        let err = reg
            .declare("state", Arc::new(StringType), AttributeOptions::new().store_key("status"))
            .unwrap_err();
        assert!(matches!(err, DocattrError::ConfigurationConflict { .. }));
        assert!(!reg.contains("state"));
    }

    #[test]
    fn same_store_key_in_other_container_is_fine() {
        let mut reg = registry();
        reg.declare("status", Arc::new(StringType), AttributeOptions::new()).unwrap();
        reg.declare_in(
            "billing_status",
            Arc::new(StringType),
            "billing",
            AttributeOptions::new().store_key("status"),
        )
        .unwrap();
        assert_eq!(reg.containers(), vec![DEFAULT_CONTAINER, "billing"]);
    }

    #[test]
    fn inheriting_copies_without_touching_the_parent() {
        let mut parent = registry();
        parent.declare("name", Arc::new(StringType), AttributeOptions::new()).unwrap();
        let mut child = parent.inherit("Gadget");
        child.declare("name", Arc::new(IntegerType), AttributeOptions::new()).unwrap();
        child.declare("volts", Arc::new(IntegerType), AttributeOptions::new()).unwrap();

        assert_eq!(parent.lookup("name").unwrap().attr_type().type_name(), "string");
        assert!(parent.lookup("volts").is_err());
        assert_eq!(child.lookup("name").unwrap().attr_type().type_name(), "integer");
        assert_eq!(child.record_type(), "Gadget");
        let names: Vec<_> = child.iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["name", "volts"]);
    }
}
