// used for persistence
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;
use tracing::{debug, trace, warn};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::construct::RecordType;
use crate::error::{DocattrError, Result};
use crate::query::{json_contains, Predicate};
use crate::record::{Document, DocumentRecord};

// columns every record table has besides its containers
const RESERVED_COLUMNS: [&str; 2] = ["id", "record_type"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(String),
}

// ------------- Persistence -------------
/// SQLite storage for records. Each record table has an integer id, the
/// name of the record's runtime type and one TEXT column of JSON per
/// container. Subtypes share their ancestor's table.
pub struct Persistor {
    connection: Connection,
}

impl Persistor {
    pub fn new(mode: &PersistenceMode) -> Result<Self> {
        let connection = match mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        // containment is evaluated by the same code inside and outside
        // the database
        connection.create_scalar_function(
            "json_contains",
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let document: Option<String> = ctx.get(0)?;
                let fragment: String = ctx.get(1)?;
                let Some(document) = document else {
                    return Ok(false);
                };
                let document: Value = serde_json::from_str(&document)
                    .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
                let fragment: Value = serde_json::from_str(&fragment)
                    .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
                Ok(json_contains(&document, &fragment))
            },
        )?;
        Ok(Persistor { connection })
    }

    /// Creates the table of `record_type` if needed and adds the columns of
    /// any container it does not have yet.
    pub fn ensure_table(&self, record_type: &RecordType) -> Result<()> {
        let table = record_type.table();
        self.connection.execute_batch(&format!(
            "
            create table if not exists \"{}\" (
                id integer primary key autoincrement,
                record_type text not null
            );
            ",
            table
        ))?;
        let existing = self.columns(table)?;
        for container in record_type.registry().containers() {
            if RESERVED_COLUMNS.contains(&container) {
                return Err(DocattrError::Config(format!(
                    "container '{}' of {} clashes with a reserved column",
                    container,
                    record_type.name()
                )));
            }
            if !existing.iter().any(|c| c == container) {
                self.connection.execute_batch(&format!(
                    "alter table \"{}\" add column \"{}\" text not null default '{{}}';",
                    table, container
                ))?;
                debug!(table, container, "document column added");
            }
        }
        Ok(())
    }

    fn columns(&self, table: &str) -> Result<Vec<String>> {
        let mut statement = self.connection.prepare("select name from pragma_table_info(?1)")?;
        let columns = statement
            .query_map(params![table], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    /// Inserts a new record, or writes the changed containers of a stored
    /// one. Returns the record's id.
    pub fn save(&self, record: &mut DocumentRecord) -> Result<i64> {
        let record_type = Arc::clone(record.record_type_arc());
        let table = record_type.table();
        let id = match record.id() {
            None => {
                let mut columns = vec!["\"record_type\"".to_string()];
                let mut values = vec![SqlValue::Text(record_type.name().to_string())];
                for (container, document) in record.documents() {
                    columns.push(format!("\"{}\"", container));
                    values.push(SqlValue::Text(serde_json::to_string(document)?));
                }
                let placeholders = (1..=values.len())
                    .map(|i| format!("?{}", i))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "insert into \"{}\" ({}) values ({})",
                    table,
                    columns.join(", "),
                    placeholders
                );
                trace!(%sql, "insert");
                self.connection.execute(&sql, params_from_iter(values.iter()))?;
                let id = self.connection.last_insert_rowid();
                record.set_id(id);
                debug!(record_type = record_type.name(), id, "record inserted");
                id
            }
            Some(id) => {
                let dirty: Vec<String> = record.dirty_containers().map(String::from).collect();
                if !dirty.is_empty() {
                    let mut assignments = Vec::with_capacity(dirty.len());
                    let mut values = Vec::with_capacity(dirty.len() + 1);
                    for (i, container) in dirty.iter().enumerate() {
                        assignments.push(format!("\"{}\" = ?{}", container, i + 1));
                        let text = match record.document(container) {
                            Some(document) => serde_json::to_string(document)?,
                            None => "{}".to_string(),
                        };
                        values.push(SqlValue::Text(text));
                    }
                    values.push(SqlValue::Integer(id));
                    let sql = format!(
                        "update \"{}\" set {} where id = ?{}",
                        table,
                        assignments.join(", "),
                        values.len()
                    );
                    trace!(%sql, "update");
                    let changed = self.connection.execute(&sql, params_from_iter(values.iter()))?;
                    if changed == 0 {
                        return Err(DocattrError::RecordNotFound {
                            record_type: record_type.name().to_string(),
                            id,
                        });
                    }
                    debug!(record_type = record_type.name(), id, containers = ?dirty, "record updated");
                }
                id
            }
        };
        record.mark_clean();
        Ok(id)
    }

    /// Loads record `id` provided its stored type is one of `lineage`.
    pub fn load(&self, lineage: &[Arc<RecordType>], id: i64) -> Result<DocumentRecord> {
        let missing = || DocattrError::RecordNotFound {
            record_type: lineage.first().map(|t| t.name().to_string()).unwrap_or_default(),
            id,
        };
        self.select(lineage, "id = ?", vec![SqlValue::Integer(id)])?
            .into_iter()
            .next()
            .ok_or_else(missing)
    }

    /// Every stored record of a type in `lineage` satisfying `predicate`,
    /// in id order.
    pub fn select_where(&self, lineage: &[Arc<RecordType>], predicate: &Predicate) -> Result<Vec<DocumentRecord>> {
        let Some(root) = lineage.first() else {
            return Ok(Vec::new());
        };
        let filter = predicate.to_sql(root.table())?;
        let params = filter.params.into_iter().map(SqlValue::Text).collect();
        self.select(lineage, &filter.clause, params)
    }

    fn select(&self, lineage: &[Arc<RecordType>], clause: &str, clause_params: Vec<SqlValue>) -> Result<Vec<DocumentRecord>> {
        let Some(root) = lineage.first() else {
            return Ok(Vec::new());
        };
        // the union of containers over the whole lineage
        let mut containers: Vec<&str> = Vec::new();
        for record_type in lineage {
            for container in record_type.registry().containers() {
                if !containers.contains(&container) {
                    containers.push(container);
                }
            }
        }
        let mut selected = vec!["id".to_string(), "record_type".to_string()];
        selected.extend(containers.iter().map(|c| format!("\"{}\"", c)));
        let type_placeholders = vec!["?"; lineage.len()].join(", ");
        let sql = format!(
            "select {} from \"{}\" where record_type in ({}) and ({}) order by id",
            selected.join(", "),
            root.table(),
            type_placeholders,
            clause
        );
        let mut params: Vec<SqlValue> = lineage.iter().map(|t| SqlValue::Text(t.name().to_string())).collect();
        params.extend(clause_params);
        trace!(%sql, "select");

        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement
            .query_map(params_from_iter(params.iter()), |row| {
                let id: i64 = row.get(0)?;
                let type_name: String = row.get(1)?;
                let mut documents = Vec::with_capacity(containers.len());
                for i in 0..containers.len() {
                    documents.push(row.get::<_, Option<String>>(i + 2)?);
                }
                Ok((id, type_name, documents))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for (id, type_name, documents) in rows {
            let Some(record_type) = lineage.iter().find(|t| t.name() == type_name) else {
                warn!(id, record_type = %type_name, "row of unexpected record type skipped");
                continue;
            };
            let own = record_type.registry().containers();
            let mut stored = BTreeMap::new();
            for (container, text) in containers.iter().zip(documents) {
                if !own.contains(container) {
                    continue;
                }
                let document = match text {
                    Some(text) => parse_document(&text, container)?,
                    None => Document::new(),
                };
                stored.insert(container.to_string(), document);
            }
            records.push(DocumentRecord::restore(Arc::clone(record_type), id, stored));
        }
        debug!(table = root.table(), rows = records.len(), "records selected");
        Ok(records)
    }
}

fn parse_document(text: &str, container: &str) -> Result<Document> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(document) => Ok(document),
        other => Err(DocattrError::Serialization(format!(
            "container '{}' holds {} instead of an object",
            container, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AttributeOptions;
    use crate::record::Record;

    fn note_type() -> Arc<RecordType> {
        RecordType::builder("Note")
            .table("notes")
            .attribute("title", "string", AttributeOptions::new())
            .unwrap()
            .attribute_in("color", "string", "style", AttributeOptions::new())
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn insert_then_load() {
        let persistor = Persistor::new(&PersistenceMode::InMemory).unwrap();
        let note_type = note_type();
        persistor.ensure_table(&note_type).unwrap();

        let mut note = DocumentRecord::new(Arc::clone(&note_type));
        note.set_attribute("title", "groceries").unwrap();
        let id = persistor.save(&mut note).unwrap();
        assert_eq!(note.id(), Some(id));
        assert!(!note.is_dirty());

        let loaded = persistor.load(&[Arc::clone(&note_type)], id).unwrap();
        assert_eq!(loaded.get_attribute("title").unwrap().as_str(), Some("groceries"));
        assert!(loaded.document("style").unwrap().is_empty());
    }

    #[test]
    fn update_writes_dirty_containers() {
        let persistor = Persistor::new(&PersistenceMode::InMemory).unwrap();
        let note_type = note_type();
        persistor.ensure_table(&note_type).unwrap();

        let mut note = DocumentRecord::new(Arc::clone(&note_type));
        let id = persistor.save(&mut note).unwrap();
        note.set_attribute("color", "yellow").unwrap();
        assert_eq!(persistor.save(&mut note).unwrap(), id);

        let loaded = persistor.load(&[note_type], id).unwrap();
        assert_eq!(loaded.get_attribute("color").unwrap().as_str(), Some("yellow"));
    }

    #[test]
    fn missing_record() {
        let persistor = Persistor::new(&PersistenceMode::InMemory).unwrap();
        let note_type = note_type();
        persistor.ensure_table(&note_type).unwrap();
        let err = persistor.load(&[note_type], 42).unwrap_err();
        assert!(matches!(err, DocattrError::RecordNotFound { id: 42, .. }));
    }

    #[test]
    fn reserved_container_names_are_rejected() {
        let persistor = Persistor::new(&PersistenceMode::InMemory).unwrap();
        let bad = RecordType::builder("Bad")
            .attribute_in("x", "string", "record_type", AttributeOptions::new())
            .unwrap()
            .build()
            .unwrap();
        assert!(matches!(persistor.ensure_table(&bad), Err(DocattrError::Config(_))));
    }

    #[test]
    fn json_contains_is_available_to_sql() {
        let persistor = Persistor::new(&PersistenceMode::InMemory).unwrap();
        let contained: bool = persistor
            .connection
            .query_row(
                "select json_contains(?1, ?2)",
                params!["{\"a\": [1, 2], \"b\": 3}", "{\"a\": [2]}"],
                |row| row.get(0),
            )
            .unwrap();
        assert!(contained);
    }
}
