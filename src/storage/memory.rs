use super::{AttributeStorage, AttributeTable};
use crate::core::{AttributeRow, MetaError, NewAttributeRow, Result, RowId, SubjectId};
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory attribute storage: one independently locked table per name.
pub struct InMemoryStorage {
    tables: HashMap<String, Arc<RwLock<AttributeTable>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Storage with the given tables already created.
    pub fn with_tables<I, T>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut storage = Self::new();
        for name in names {
            storage.create_table(name)?;
        }
        Ok(storage)
    }

    pub fn create_table(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.tables.contains_key(&name) {
            return Err(MetaError::TableExists(name));
        }
        let table = Arc::new(RwLock::new(AttributeTable::new(name.clone())));
        self.tables.insert(name, table);
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        if self.tables.remove(name).is_none() {
            return Err(MetaError::TableNotFound(name.to_string()));
        }
        Ok(())
    }

    pub fn get_table(&self, name: &str) -> Result<Arc<RwLock<AttributeTable>>> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| MetaError::TableNotFound(name.to_string()))
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub async fn row_count(&self, table: &str) -> Result<usize> {
        let handle = self.get_table(table)?;
        let table = handle.read().await;
        Ok(table.row_count())
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttributeStorage for InMemoryStorage {
    async fn find(
        &self,
        table: &str,
        subject_id: SubjectId,
        key: &str,
    ) -> Result<Option<AttributeRow>> {
        let handle = self.get_table(table)?;
        let table = handle.read().await;
        Ok(table.find(subject_id, key).cloned())
    }

    async fn insert(&self, table: &str, row: NewAttributeRow) -> Result<RowId> {
        let handle = self.get_table(table)?;
        let mut table = handle.write().await;
        let id = table.insert(row)?;
        debug!("inserted attribute row {} into '{}'", id, table.name());
        Ok(id)
    }

    async fn update(&self, table: &str, id: RowId, value: Option<String>) -> Result<bool> {
        let handle = self.get_table(table)?;
        let mut table = handle.write().await;
        Ok(table.update(id, value))
    }

    async fn delete(&self, table: &str, id: RowId) -> Result<bool> {
        let handle = self.get_table(table)?;
        let mut table = handle.write().await;
        Ok(table.delete(id))
    }

    async fn scan_key(&self, table: &str, key: &str) -> Result<Vec<AttributeRow>> {
        let handle = self.get_table(table)?;
        let table = handle.read().await;
        Ok(table.scan_key(key))
    }

    async fn scan_subject(&self, table: &str, subject_id: SubjectId) -> Result<Vec<AttributeRow>> {
        let handle = self.get_table(table)?;
        let table = handle.read().await;
        Ok(table.scan_subject(subject_id))
    }
}
