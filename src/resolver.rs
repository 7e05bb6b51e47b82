//! Ad-hoc read access to a subject's attributes, plus attribute joins.
//!
//! Attributes read like native fields through `attr`-prefixed names:
//! `attrFavoriteColor` resolves the `favoriteColor` key. Names without the
//! prefix are left to the subject.

use crate::core::{CachedValue, Result, SubjectId};
use crate::model::AttributeModel;
use crate::model::inflector::lcfirst;
use crate::storage::{AttributeCache, CacheStats};
use crate::store::AttributeStore;
use std::collections::{BTreeMap, BTreeSet};

/// Prefix marking a virtual attribute property or relation.
pub const ATTRIBUTE_PREFIX: &str = "attr";

/// Attribute key behind a virtual property name, if it is one.
pub fn attribute_key_for_property(name: &str) -> Option<String> {
    let rest = name.strip_prefix(ATTRIBUTE_PREFIX)?;
    if !rest.starts_with(char::is_uppercase) {
        return None;
    }
    Some(lcfirst(rest))
}

/// Outcome of a virtual property lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyLookup {
    Attribute(CachedValue),
    /// Not an attribute name; resolve it on the subject itself.
    Passthrough,
}

/// Cached read session for one subject.
pub struct AttributeResolver {
    store: AttributeStore,
    subject_id: Option<SubjectId>,
    cache: AttributeCache,
}

impl AttributeResolver {
    pub fn new(store: AttributeStore, subject_id: Option<SubjectId>) -> Self {
        Self {
            store,
            subject_id,
            cache: AttributeCache::new(),
        }
    }

    pub fn subject_id(&self) -> Option<SubjectId> {
        self.subject_id
    }

    /// Value of `key`; storage is read at most once per key.
    pub async fn get(&mut self, key: &str) -> Result<CachedValue> {
        self.cache
            .resolve(
                self.store.storage(),
                &self.store.model().table,
                self.subject_id,
                key,
            )
            .await
    }

    /// Resolves an `attr<Key>` property name.
    pub async fn property(&mut self, name: &str) -> Result<PropertyLookup> {
        match attribute_key_for_property(name) {
            Some(key) => Ok(PropertyLookup::Attribute(self.get(&key).await?)),
            None => Ok(PropertyLookup::Passthrough),
        }
    }

    pub fn can_get_property(name: &str) -> bool {
        attribute_key_for_property(name).is_some()
    }

    /// Loads every stored attribute of the subject in one read.
    pub async fn preload(&mut self) -> Result<usize> {
        let Some(subject_id) = self.subject_id else {
            return Ok(0);
        };
        let rows = self
            .store
            .storage()
            .scan_subject(&self.store.model().table, subject_id)
            .await?;
        let count = rows.len();
        self.cache
            .prime(rows.into_iter().map(|row| (row.key, CachedValue::from(row.value))));
        Ok(count)
    }

    /// Join descriptor for `key`, aliased by the key.
    pub fn join_on(&self, key: &str) -> AttributeJoin {
        AttributeJoin::new(self.store.model(), key)
    }

    /// Join descriptor behind an `attr<Key>` relation name.
    pub fn relation(&self, name: &str) -> Option<AttributeJoin> {
        attribute_key_for_property(name).map(|key| self.join_on(&key))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Inner join of the subject table on the attribute table, pre-filtered to
/// one key and aliased by that key so several joins can share a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeJoin {
    pub subject_table: String,
    pub attribute_table: String,
    pub foreign_key_field: String,
    pub key: String,
}

impl AttributeJoin {
    pub fn new(model: &AttributeModel, key: &str) -> Self {
        Self {
            subject_table: model.subject_table.clone(),
            attribute_table: model.table.clone(),
            foreign_key_field: model.foreign_key_field(),
            key: key.to_string(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.key
    }

    /// SQL rendering for relational back ends.
    pub fn to_sql(&self) -> String {
        let alias = quote_identifier(self.alias());
        format!(
            "INNER JOIN {table} AS {alias} ON {alias}.{fk} = {subject}.\"id\" AND {alias}.\"key\" = '{key}'",
            table = quote_identifier(&self.attribute_table),
            fk = quote_identifier(&self.foreign_key_field),
            subject = quote_identifier(&self.subject_table),
            key = self.key.replace('\'', "''"),
        )
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Predicate on the joined attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueFilter {
    Any,
    Equals(String),
    NotEquals(String),
}

impl ValueFilter {
    fn accepts(&self, value: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Equals(expected) => value == Some(expected.as_str()),
            Self::NotEquals(expected) => value != Some(expected.as_str()),
        }
    }
}

/// One subject matched by a [`SubjectQuery`], with its joined values by alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    pub subject_id: SubjectId,
    pub values: BTreeMap<String, Option<String>>,
}

/// Filters subjects by their attributes through inner joins.
pub struct SubjectQuery {
    store: AttributeStore,
    joins: Vec<(AttributeJoin, ValueFilter)>,
}

impl SubjectQuery {
    pub fn new(store: AttributeStore) -> Self {
        Self {
            store,
            joins: Vec::new(),
        }
    }

    /// Subjects must have a row for `key`.
    pub fn join(self, key: &str) -> Self {
        self.join_where(key, ValueFilter::Any)
    }

    /// Subjects must have a row for `key` whose value passes `filter`.
    pub fn join_where(mut self, key: &str, filter: ValueFilter) -> Self {
        let join = AttributeJoin::new(self.store.model(), key);
        self.joins.retain(|(existing, _)| existing.alias() != join.alias());
        self.joins.push((join, filter));
        self
    }

    pub fn joins(&self) -> impl Iterator<Item = &AttributeJoin> {
        self.joins.iter().map(|(join, _)| join)
    }

    pub async fn fetch(&self) -> Result<Vec<JoinedRow>> {
        let mut matched: Option<BTreeMap<SubjectId, BTreeMap<String, Option<String>>>> = None;

        for (join, filter) in &self.joins {
            let rows = self
                .store
                .storage()
                .scan_key(&join.attribute_table, &join.key)
                .await?;
            let hits: BTreeMap<SubjectId, Option<String>> = rows
                .into_iter()
                .filter(|row| filter.accepts(row.value.as_deref()))
                .map(|row| (row.subject_id, row.value))
                .collect();

            let mut next = BTreeMap::new();
            match matched.take() {
                None => {
                    for (subject_id, value) in hits {
                        let mut values = BTreeMap::new();
                        values.insert(join.alias().to_string(), value);
                        next.insert(subject_id, values);
                    }
                }
                Some(previous) => {
                    for (subject_id, mut values) in previous {
                        if let Some(value) = hits.get(&subject_id) {
                            values.insert(join.alias().to_string(), value.clone());
                            next.insert(subject_id, values);
                        }
                    }
                }
            }
            matched = Some(next);
        }

        Ok(matched
            .unwrap_or_default()
            .into_iter()
            .map(|(subject_id, values)| JoinedRow { subject_id, values })
            .collect())
    }

    pub async fn subject_ids(&self) -> Result<BTreeSet<SubjectId>> {
        Ok(self
            .fetch()
            .await?
            .into_iter()
            .map(|row| row.subject_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{ATTRIBUTE_PREFIX, AttributeJoin, attribute_key_for_property};

    #[test]
    fn only_prefixed_names_are_attributes() {
        assert_eq!(attribute_key_for_property("attrTestData"), Some("testData".into()));
        assert_eq!(attribute_key_for_property("attrBio"), Some("bio".into()));
        assert_eq!(attribute_key_for_property(ATTRIBUTE_PREFIX), None);
        assert_eq!(attribute_key_for_property("title"), None);
        assert_eq!(attribute_key_for_property("attributes"), None);
        assert_eq!(attribute_key_for_property("attribution"), None);
        assert_eq!(attribute_key_for_property("attr_bio"), None);
    }

    #[test]
    fn join_sql_quotes_every_identifier() {
        let join = AttributeJoin {
            subject_table: "us\"er".into(),
            attribute_table: "user\"meta".into(),
            foreign_key_field: "user\"id".into(),
            key: "o'neil".into(),
        };
        assert_eq!(
            join.to_sql(),
            "INNER JOIN \"user\"\"meta\" AS \"o'neil\" ON \"o'neil\".\"user\"\"id\" = \"us\"\"er\".\"id\" AND \"o'neil\".\"key\" = 'o''neil'"
        );
    }
}
