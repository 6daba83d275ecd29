//! docattr – typed attributes stored inside JSON document columns.
//!
//! Instead of one relational column per field, a record keeps a handful of
//! *document columns* (JSON objects) and application code declares typed
//! logical attributes that live inside them:
//! * An [`datatype::AttributeType`] knows how to cast raw input, serialize it
//!   for the document and deserialize it again.
//! * An [`definition::AttributeDefinition`] binds an attribute name to a type,
//!   a store key and a container (the document column it lives in).
//! * An [`registry::AttributeRegistry`] holds the definitions of one
//!   [`construct::RecordType`]. Subtypes copy it and extend the copy.
//! * [`record::Record`] gives every record a generic getter and setter that go
//!   through its runtime type's registry.
//! * [`query::ContainmentQueryBuilder`] turns `{name: value}` criteria into a
//!   containment predicate, encoding values exactly as setters store them.
//!
//! ## Modules
//! * [`datatype`] – The type trait, the in-memory [`datatype::AttrValue`] and
//!   the built-in types (integer, float, decimal, boolean, string, date,
//!   datetime, json, arrays and serde-backed value objects).
//! * [`definition`] / [`registry`] – Declarations and their per-type registry.
//! * [`construct`] – Record types, the catalog keeping them and the database.
//! * [`record`] – Host document access, accessors and an in-memory record.
//! * [`query`] – Structural containment and the predicate builder.
//! * [`persist`] – SQLite storage with a `json_contains` SQL function.
//! * [`settings`] – Configuration and logging setup.
//!
//! ## Quick Start
//! ```
//! use docattr::construct::{Catalog, Database, RecordType};
//! use docattr::definition::AttributeOptions;
//! use docattr::persist::PersistenceMode;
//! use docattr::record::Record;
//!
//! let mut catalog = Catalog::new();
//! catalog.keep(
//!     RecordType::builder("Task")
//!         .attribute("status", "string", AttributeOptions::new()).unwrap()
//!         .attribute("estimate", "integer", AttributeOptions::new()).unwrap()
//!         .build().unwrap(),
//! ).unwrap();
//! let db = Database::new(catalog, PersistenceMode::InMemory).unwrap();
//!
//! let mut task = db.new_record("Task").unwrap();
//! task.set_attribute("status", "active").unwrap();
//! task.set_attribute("estimate", "3").unwrap();
//! db.save(&mut task).unwrap();
//!
//! let active = db.json_attributes_where("Task", [("status", "active")]).unwrap();
//! assert_eq!(active.len(), 1);
//! assert_eq!(active[0].get_attribute("estimate").unwrap().as_i64(), Some(3));
//! ```
//!
//! ## Concurrency
//! Record types are built during startup and are immutable afterwards, so
//! they can be read from any number of threads without locking. A record
//! carries no locking of its own. The [`construct::Database`] serializes
//! access to its SQLite connection.

pub mod construct;
pub mod datatype;
pub mod definition;
pub mod error;
pub mod persist;
pub mod query;
pub mod record;
pub mod registry;
pub mod settings;
