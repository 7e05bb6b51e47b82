use crate::core::{AttributeRow, MetaError, NewAttributeRow, Result, RowId, SubjectId};
use std::collections::BTreeMap;

/// One attribute side table with a unique index on `(subject_id, key)`.
#[derive(Debug, Clone)]
pub struct AttributeTable {
    name: String,
    rows: BTreeMap<RowId, AttributeRow>,
    next_row_id: usize,
    unique: BTreeMap<(SubjectId, String), RowId>,
}

impl AttributeTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            next_row_id: 1,
            unique: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, row: NewAttributeRow) -> Result<RowId> {
        self.check_uniqueness(row.subject_id, &row.key)?;

        let id = RowId(self.next_row_id);
        self.next_row_id += 1;

        self.unique.insert((row.subject_id, row.key.clone()), id);
        self.rows.insert(
            id,
            AttributeRow {
                id,
                subject_id: row.subject_id,
                key: row.key,
                value: row.value,
            },
        );
        Ok(id)
    }

    pub fn update(&mut self, id: RowId, value: Option<String>) -> bool {
        match self.rows.get_mut(&id) {
            Some(row) => {
                row.value = value;
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: RowId) -> bool {
        match self.rows.remove(&id) {
            Some(row) => {
                self.unique.remove(&(row.subject_id, row.key));
                true
            }
            None => false,
        }
    }

    pub fn find(&self, subject_id: SubjectId, key: &str) -> Option<&AttributeRow> {
        self.unique
            .get(&(subject_id, key.to_string()))
            .and_then(|id| self.rows.get(id))
    }

    pub fn scan_key(&self, key: &str) -> Vec<AttributeRow> {
        self.rows
            .values()
            .filter(|row| row.key == key)
            .cloned()
            .collect()
    }

    pub fn scan_subject(&self, subject_id: SubjectId) -> Vec<AttributeRow> {
        self.unique
            .range((subject_id, String::new())..)
            .take_while(|((owner, _), _)| *owner == subject_id)
            .filter_map(|(_, id)| self.rows.get(id).cloned())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn check_uniqueness(&self, subject_id: SubjectId, key: &str) -> Result<()> {
        if self.unique.contains_key(&(subject_id, key.to_string())) {
            return Err(MetaError::ConstraintViolation(format!(
                "Unique constraint violation: table '{}' already contains (subject_id, key) = ({}, '{}')",
                self.name, subject_id, key
            )));
        }
        Ok(())
    }
}
