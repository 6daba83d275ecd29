use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

// our own stuff that we need
use crate::datatype::{AttrValue, IntoAttributeType};
use crate::definition::{validate_identifier, AttributeOptions, DEFAULT_CONTAINER};
use crate::error::{DocattrError, Result};
use crate::persist::{PersistenceMode, Persistor};
use crate::query::{ContainmentQueryBuilder, Predicate};
use crate::record::DocumentRecord;
use crate::registry::{AttributeRegistry, NameHasher};
use crate::settings::Settings;

// ------------- RecordType -------------
/// Describes one kind of record: its name, the table it lives in and the
/// json attributes it declares.
///
/// A record type is only ever built through [`RecordTypeBuilder`] and is
/// immutable afterwards. Instances hold it through an `Arc`, so every record
/// consults the registry of its own runtime type.
#[derive(Debug)]
pub struct RecordType {
    name: String,
    table: String,
    // nearest first
    ancestors: Vec<String>,
    registry: AttributeRegistry,
}

impl RecordType {
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder::new(name)
    }
    /// Starts a subtype that sees every attribute `self` declares and shares
    /// its table.
    pub fn inherit(&self, name: impl Into<String>) -> RecordTypeBuilder {
        let name = name.into();
        let mut ancestors = vec![self.name.clone()];
        ancestors.extend(self.ancestors.iter().cloned());
        RecordTypeBuilder {
            registry: self.registry.inherit(name.clone()),
            name,
            table: self.table.clone(),
            ancestors,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn table(&self) -> &str {
        &self.table
    }
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }
    pub fn registry(&self) -> &AttributeRegistry {
        &self.registry
    }
    pub fn is_a(&self, name: &str) -> bool {
        self.name == name || self.ancestors.iter().any(|a| a == name)
    }
    /// The containment predicate for `criteria` against this type's documents.
    pub fn json_attributes_where<I, K, V>(&self, criteria: I) -> Result<Predicate>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        ContainmentQueryBuilder::new(&self.registry).build(criteria)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.table)
    }
}

pub struct RecordTypeBuilder {
    name: String,
    table: String,
    ancestors: Vec<String>,
    registry: AttributeRegistry,
}

impl RecordTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            table: name.to_lowercase(),
            registry: AttributeRegistry::new(name.clone(), DEFAULT_CONTAINER),
            ancestors: Vec::new(),
            name,
        }
    }
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
    /// Applies the configured default container. Only affects attributes
    /// declared afterwards.
    pub fn with_settings(self, settings: &Settings) -> Self {
        self.default_container(settings.default_container.clone())
    }
    pub fn default_container(mut self, container: impl Into<String>) -> Self {
        self.registry.set_default_container(container);
        self
    }
    /// Declares a json attribute in the default container.
    pub fn attribute(
        mut self,
        name: &str,
        attr_type: impl IntoAttributeType,
        options: AttributeOptions,
    ) -> Result<Self> {
        self.registry.declare(name, attr_type.into_attribute_type()?, options)?;
        Ok(self)
    }
    /// Declares a json attribute stored in `container`.
    pub fn attribute_in(
        mut self,
        name: &str,
        attr_type: impl IntoAttributeType,
        container: &str,
        options: AttributeOptions,
    ) -> Result<Self> {
        self.registry
            .declare_in(name, attr_type.into_attribute_type()?, container, options)?;
        Ok(self)
    }
    pub fn build(self) -> Result<Arc<RecordType>> {
        validate_identifier("record type", &self.name)?;
        validate_identifier("table", &self.table)?;
        debug!(
            record_type = %self.name,
            table = %self.table,
            attributes = self.registry.len(),
            "record type built"
        );
        Ok(Arc::new(RecordType {
            name: self.name,
            table: self.table,
            ancestors: self.ancestors,
            registry: self.registry,
        }))
    }
}

// ------------- Catalog -------------
/// Keeps every registered record type. Filled during startup and handed to
/// a [`Database`], after which it is only read.
#[derive(Debug, Default)]
pub struct Catalog {
    kept: HashMap<String, Arc<RecordType>, NameHasher>,
    order: Vec<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn keep(&mut self, record_type: Arc<RecordType>) -> Result<Arc<RecordType>> {
        let name = record_type.name().to_string();
        if self.kept.contains_key(&name) {
            return Err(DocattrError::Config(format!("record type {} is already registered", name)));
        }
        for ancestor in record_type.ancestors() {
            let Some(kept) = self.kept.get(ancestor) else {
                return Err(DocattrError::UnknownRecordType(ancestor.clone()));
            };
            if kept.table() != record_type.table() {
                return Err(DocattrError::Config(format!(
                    "{} must share the table of its ancestor {}",
                    name, ancestor
                )));
            }
        }
        self.kept.insert(name.clone(), Arc::clone(&record_type));
        self.order.push(name);
        Ok(record_type)
    }
    pub fn get(&self, name: &str) -> Result<Arc<RecordType>> {
        self.kept
            .get(name)
            .cloned()
            .ok_or_else(|| DocattrError::UnknownRecordType(name.to_string()))
    }
    /// The type itself followed by every kept type descending from it.
    pub fn lineage(&self, name: &str) -> Result<Vec<Arc<RecordType>>> {
        let root = self.get(name)?;
        let mut lineage = vec![Arc::clone(&root)];
        lineage.extend(
            self.iter()
                .filter(|t| t.name() != name && t.is_a(name))
                .cloned(),
        );
        Ok(lineage)
    }
    /// Record types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RecordType>> {
        self.order.iter().filter_map(|name| self.kept.get(name))
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}

// ------------- Database -------------
// This sets up the storage with the necessary tables
pub struct Database {
    catalog: Catalog,
    persistor: Mutex<Persistor>,
}

impl Database {
    pub fn new(catalog: Catalog, mode: PersistenceMode) -> Result<Self> {
        let persistor = Persistor::new(&mode)?;
        for record_type in catalog.iter() {
            persistor.ensure_table(record_type)?;
        }
        info!(record_types = catalog.len(), mode = ?mode, "database opened");
        Ok(Self {
            catalog,
            persistor: Mutex::new(persistor),
        })
    }
    pub fn open(settings: &Settings, catalog: Catalog) -> Result<Self> {
        Self::new(catalog, settings.persistence_mode()?)
    }
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
    fn persistor(&self) -> Result<MutexGuard<'_, Persistor>> {
        self.persistor.lock().map_err(|e| DocattrError::Lock(e.to_string()))
    }
    /// A fresh, unsaved record of the named type.
    pub fn new_record(&self, type_name: &str) -> Result<DocumentRecord> {
        Ok(DocumentRecord::new(self.catalog.get(type_name)?))
    }
    pub fn save(&self, record: &mut DocumentRecord) -> Result<i64> {
        self.persistor()?.save(record)
    }
    /// Loads a record of the named type or any of its subtypes. The record
    /// comes back as its stored runtime type.
    pub fn find(&self, type_name: &str, id: i64) -> Result<DocumentRecord> {
        let lineage = self.catalog.lineage(type_name)?;
        self.persistor()?.load(&lineage, id)
    }
    /// Every stored record of the named type (subtypes included) whose
    /// documents contain the given attribute values. Empty criteria match
    /// every record.
    pub fn json_attributes_where<I, K, V>(&self, type_name: &str, criteria: I) -> Result<Vec<DocumentRecord>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        let lineage = self.catalog.lineage(type_name)?;
        let predicate = lineage[0].json_attributes_where(criteria)?;
        self.persistor()?.select_where(&lineage, &predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::IntegerType;

    fn animal() -> Arc<RecordType> {
        RecordType::builder("Animal")
            .table("animals")
            .attribute("name", "string", AttributeOptions::new())
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn builder_routes_to_containers() {
        let record_type = RecordType::builder("Account")
            .attribute("nickname", "string", AttributeOptions::new())
            .unwrap()
            .attribute_in("plan", "string", "billing", AttributeOptions::new())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(record_type.table(), "account");
        assert_eq!(record_type.registry().containers(), vec!["json_attributes", "billing"]);
    }

    #[test]
    fn default_container_keeps_earlier_declarations() {
        let record_type = RecordType::builder("Account")
            .attribute("nickname", "string", AttributeOptions::new())
            .unwrap()
            .default_container("profile")
            .attribute("bio", "string", AttributeOptions::new())
            .unwrap()
            .build()
            .unwrap();
        let registry = record_type.registry();
        assert_eq!(registry.lookup("nickname").unwrap().container(), "json_attributes");
        assert_eq!(registry.lookup("bio").unwrap().container(), "profile");
    }

    #[test]
    fn unknown_type_name_fails_the_declaration() {
        let result = RecordType::builder("Account").attribute("n", "uuid", AttributeOptions::new());
        assert!(matches!(result, Err(DocattrError::UnknownType(_))));
    }

    #[test]
    fn subtypes_extend_a_copy() {
        let animal = animal();
        let dog = animal
            .inherit("Dog")
            .attribute("good_boy", "boolean", AttributeOptions::new())
            .unwrap()
            .attribute("name", IntegerType, AttributeOptions::new())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(dog.table(), "animals");
        assert!(dog.is_a("Animal"));
        assert!(!animal.is_a("Dog"));
        assert!(animal.registry().lookup("good_boy").is_err());
        assert_eq!(animal.registry().lookup("name").unwrap().attr_type().type_name(), "string");
        assert_eq!(dog.registry().lookup("name").unwrap().attr_type().type_name(), "integer");
    }

    #[test]
    fn catalog_lineage_includes_descendants() {
        let animal = animal();
        let dog = animal.inherit("Dog").build().unwrap();
        let puppy = dog.inherit("Puppy").build().unwrap();
        let mut catalog = Catalog::new();
        catalog.keep(Arc::clone(&animal)).unwrap();
        catalog.keep(Arc::clone(&dog)).unwrap();
        catalog.keep(Arc::clone(&puppy)).unwrap();

        let names: Vec<_> = catalog.lineage("Dog").unwrap().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["Dog", "Puppy"]);
        assert!(catalog.keep(dog).is_err());
        assert!(matches!(catalog.get("Cat"), Err(DocattrError::UnknownRecordType(_))));
    }

    #[test]
    fn catalog_requires_ancestors_first() {
        let animal = animal();
        let dog = animal.inherit("Dog").build().unwrap();
        let mut catalog = Catalog::new();
        assert!(matches!(catalog.keep(dog), Err(DocattrError::UnknownRecordType(_))));
    }
}
