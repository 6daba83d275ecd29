//! Records and the accessors for their json attributes.
//!
//! The host side of a record is reduced to [`DocumentAccess`]: reading and
//! writing a single key of a single document column. [`Record`] adds the
//! runtime record type, and from those two the generic accessors
//! [`Record::get_attribute`] and [`Record::set_attribute`] follow. The
//! [`json_accessors!`](crate::json_accessors) macro generates named
//! accessors on top of the generic pair.
//!
//! Getters return the *deserialized* value. The document always holds the
//! serialized form, which is also what containment queries are built from,
//! so a value read back through a getter is the one a query matches on.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::trace;

use crate::construct::RecordType;
use crate::datatype::AttrValue;
use crate::error::{DocattrError, Result};

/// One document column is a JSON object.
pub type Document = Map<String, Value>;

/// Reads and writes single keys of a record's document columns.
pub trait DocumentAccess {
    fn read_document_field(&self, container: &str, store_key: &str) -> Option<Value>;
    /// Writes `value` under `store_key`, marking the container as changed.
    fn write_document_field(&mut self, container: &str, store_key: &str, value: Value);
}

pub trait Record: DocumentAccess {
    /// The runtime type of this record. Accessors always look attributes up
    /// here rather than on whichever type declared them.
    fn record_type(&self) -> &RecordType;

    fn get_attribute(&self, name: &str) -> Result<AttrValue> {
        let definition = self.record_type().registry().lookup(name)?;
        match self.read_document_field(definition.container(), definition.store_key()) {
            Some(stored) => definition.deserialize(&stored),
            None => Ok(definition.default_value().cloned().unwrap_or(AttrValue::Null)),
        }
    }

    /// Casts and serializes `value`, then writes it. Nothing is written if
    /// either step fails.
    fn set_attribute<V: Into<AttrValue>>(&mut self, name: &str, value: V) -> Result<()>
    where
        Self: Sized,
    {
        let definition = Arc::clone(self.record_type().registry().lookup(name)?);
        let stored = definition.encode(&value.into())?;
        trace!(
            record_type = %self.record_type().name(),
            attribute = name,
            container = definition.container(),
            store_key = definition.store_key(),
            value = %stored,
            "attribute set"
        );
        self.write_document_field(definition.container(), definition.store_key(), stored);
        Ok(())
    }

    /// The stored, still serialized, value.
    fn raw_attribute(&self, name: &str) -> Result<Option<Value>> {
        let definition = self.record_type().registry().lookup(name)?;
        Ok(self.read_document_field(definition.container(), definition.store_key()))
    }
}

/// Generates a named getter and setter per attribute for a type
/// implementing [`Record`].
///
/// ```
/// use std::sync::Arc;
/// use docattr::construct::RecordType;
/// use docattr::definition::AttributeOptions;
/// use docattr::json_accessors;
/// use docattr::record::{DocumentAccess, DocumentRecord, Record};
/// use serde_json::Value;
///
/// struct Ticket(DocumentRecord);
/// impl DocumentAccess for Ticket {
///     fn read_document_field(&self, container: &str, key: &str) -> Option<Value> {
///         self.0.read_document_field(container, key)
///     }
///     fn write_document_field(&mut self, container: &str, key: &str, value: Value) {
///         self.0.write_document_field(container, key, value)
///     }
/// }
/// impl Record for Ticket {
///     fn record_type(&self) -> &RecordType {
///         self.0.record_type()
///     }
/// }
/// json_accessors!(Ticket { severity => set_severity });
///
/// let ticket_type = RecordType::builder("Ticket")
///     .attribute("severity", "integer", AttributeOptions::new())
///     .unwrap()
///     .build()
///     .unwrap();
/// let mut ticket = Ticket(DocumentRecord::new(ticket_type));
/// ticket.set_severity("2").unwrap();
/// assert_eq!(ticket.severity().unwrap().as_i64(), Some(2));
/// ```
#[macro_export]
macro_rules! json_accessors {
    ($record:ty { $($name:ident => $setter:ident),* $(,)? }) => {
        impl $record {
            $(
                pub fn $name(&self) -> $crate::error::Result<$crate::datatype::AttrValue> {
                    $crate::record::Record::get_attribute(self, stringify!($name))
                }
                pub fn $setter<V: Into<$crate::datatype::AttrValue>>(
                    &mut self,
                    value: V,
                ) -> $crate::error::Result<()> {
                    $crate::record::Record::set_attribute(self, stringify!($name), value)
                }
            )*
        }
    };
}

// ------------- DocumentRecord -------------
/// An in-memory record: an optional id, its runtime type and one document
/// per container, with the containers changed since the last save.
#[derive(Clone)]
pub struct DocumentRecord {
    id: Option<i64>,
    record_type: Arc<RecordType>,
    documents: BTreeMap<String, Document>,
    dirty: BTreeSet<String>,
}

impl DocumentRecord {
    pub fn new(record_type: Arc<RecordType>) -> Self {
        let documents = record_type
            .registry()
            .containers()
            .into_iter()
            .map(|c| (c.to_string(), Document::new()))
            .collect();
        Self {
            id: None,
            record_type,
            documents,
            dirty: BTreeSet::new(),
        }
    }
    pub(crate) fn restore(record_type: Arc<RecordType>, id: i64, stored: BTreeMap<String, Document>) -> Self {
        let mut record = Self::new(record_type);
        record.id = Some(id);
        record.documents.extend(stored);
        record
    }
    pub fn id(&self) -> Option<i64> {
        self.id
    }
    pub(crate) fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
    pub fn record_type_arc(&self) -> &Arc<RecordType> {
        &self.record_type
    }
    pub fn document(&self, container: &str) -> Option<&Document> {
        self.documents.get(container)
    }
    pub fn documents(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.documents.iter().map(|(c, d)| (c.as_str(), d))
    }
    /// Replaces a whole document column, bypassing the attribute types.
    pub fn set_document(&mut self, container: &str, document: Document) -> Result<()> {
        if !self.documents.contains_key(container) {
            return Err(DocattrError::InvalidIdentifier(format!(
                "container '{}' is not used by {}",
                container,
                self.record_type.name()
            )));
        }
        self.documents.insert(container.to_string(), document);
        self.dirty.insert(container.to_string());
        Ok(())
    }
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
    pub fn dirty_containers(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }
    pub(crate) fn mark_clean(&mut self) {
        self.dirty.clear();
    }
}

impl DocumentAccess for DocumentRecord {
    fn read_document_field(&self, container: &str, store_key: &str) -> Option<Value> {
        self.documents.get(container)?.get(store_key).cloned()
    }
    fn write_document_field(&mut self, container: &str, store_key: &str, value: Value) {
        self.documents
            .entry(container.to_string())
            .or_default()
            .insert(store_key.to_string(), value);
        self.dirty.insert(container.to_string());
    }
}

impl Record for DocumentRecord {
    fn record_type(&self) -> &RecordType {
        &self.record_type
    }
}

impl fmt::Debug for DocumentRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DocumentRecord")
            .field("id", &self.id)
            .field("record_type", &self.record_type.name())
            .field("documents", &self.documents)
            .field("dirty", &self.dirty)
            .finish()
    }
}
