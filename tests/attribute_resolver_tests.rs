/// Attribute resolver tests
///
/// Cached reads, virtual `attr<Key>` properties and attribute joins
/// Run with: cargo test --test attribute_resolver_tests

use async_trait::async_trait;
use metastore::{
    AttributeModel, AttributeRow, AttributeStorage, AttributeStore, CachedValue, DocumentSubject,
    InMemoryStorage, InMemorySubjectStore, NewAttributeRow, PropertyLookup, Result, RowId,
    SubjectId, ValueFilter,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts point lookups reaching the engine.
struct CountingStorage {
    inner: InMemoryStorage,
    finds: AtomicUsize,
}

#[async_trait]
impl AttributeStorage for CountingStorage {
    async fn find(&self, table: &str, subject_id: SubjectId, key: &str) -> Result<Option<AttributeRow>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(table, subject_id, key).await
    }

    async fn insert(&self, table: &str, row: NewAttributeRow) -> Result<RowId> {
        self.inner.insert(table, row).await
    }

    async fn update(&self, table: &str, id: RowId, value: Option<String>) -> Result<bool> {
        self.inner.update(table, id, value).await
    }

    async fn delete(&self, table: &str, id: RowId) -> Result<bool> {
        self.inner.delete(table, id).await
    }

    async fn scan_key(&self, table: &str, key: &str) -> Result<Vec<AttributeRow>> {
        self.inner.scan_key(table, key).await
    }

    async fn scan_subject(&self, table: &str, subject_id: SubjectId) -> Result<Vec<AttributeRow>> {
        self.inner.scan_subject(table, subject_id).await
    }
}

async fn setup() -> (Arc<CountingStorage>, AttributeStore) {
    let storage = Arc::new(CountingStorage {
        inner: InMemoryStorage::with_tables(["post_meta"]).unwrap(),
        finds: AtomicUsize::new(0),
    });
    let posts = Arc::new(InMemorySubjectStore::<DocumentSubject>::new("post"));
    for id in 1..=3 {
        posts.insert_with_id(SubjectId(id), DocumentSubject::new()).await;
    }
    let store = AttributeStore::new(
        storage.clone(),
        posts,
        AttributeModel::new("post_meta", "post"),
    )
    .unwrap();

    let rows = [
        (1, "color", Some("red")),
        (1, "empty", Some("")),
        (1, "nothing", None),
        (1, "testData", Some("payload")),
        (2, "color", Some("blue")),
        (2, "size", Some("xl")),
        (3, "color", Some("red")),
        (3, "size", Some("s")),
    ];
    for (subject, key, value) in rows {
        store
            .insert(NewAttributeRow {
                subject_id: SubjectId(subject),
                key: key.to_string(),
                value: value.map(str::to_string),
            })
            .await
            .unwrap();
    }
    (storage, store)
}

#[tokio::test]
async fn test_each_key_is_read_from_storage_once() {
    let (storage, store) = setup().await;
    let mut resolver = store.resolver(Some(SubjectId(1)));

    for _ in 0..3 {
        assert_eq!(resolver.get("color").await.unwrap(), CachedValue::Set("red".into()));
        assert!(resolver.get("ghost").await.unwrap().is_unset());
    }

    assert_eq!(storage.finds.load(Ordering::SeqCst), 2);
    assert_eq!(resolver.cache_stats().misses, 2);
    assert_eq!(resolver.cache_stats().hits, 4);
}

#[tokio::test]
async fn test_empty_string_is_not_unset() {
    let (_, store) = setup().await;
    let mut resolver = store.resolver(Some(SubjectId(1)));

    assert_eq!(resolver.get("empty").await.unwrap(), CachedValue::Set(String::new()));
    assert_eq!(resolver.get("nothing").await.unwrap(), CachedValue::Unset);
    assert_eq!(resolver.get("missing").await.unwrap(), CachedValue::Unset);
}

#[tokio::test]
async fn test_cache_is_not_invalidated_by_later_writes() {
    let (_, store) = setup().await;
    let mut resolver = store.resolver(Some(SubjectId(1)));
    assert_eq!(resolver.get("color").await.unwrap().as_deref(), Some("red"));

    let row = store.find(SubjectId(1), "color").await.unwrap().unwrap();
    store.update(row.id, Some("green".into())).await.unwrap();

    assert_eq!(resolver.get("color").await.unwrap().as_deref(), Some("red"));
    let mut fresh = store.resolver(Some(SubjectId(1)));
    assert_eq!(fresh.get("color").await.unwrap().as_deref(), Some("green"));
}

#[tokio::test]
async fn test_unsaved_subject_never_queries_storage() {
    let (storage, store) = setup().await;
    let mut resolver = store.resolver(None);
    assert!(resolver.get("color").await.unwrap().is_unset());
    assert_eq!(storage.finds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_prefixed_properties_resolve_attributes() {
    let (_, store) = setup().await;
    let mut resolver = store.resolver(Some(SubjectId(1)));

    assert_eq!(
        resolver.property("attrTestData").await.unwrap(),
        PropertyLookup::Attribute(CachedValue::Set("payload".into()))
    );
    assert_eq!(
        resolver.property("attrColor").await.unwrap(),
        PropertyLookup::Attribute(CachedValue::Set("red".into()))
    );
    assert_eq!(resolver.property("title").await.unwrap(), PropertyLookup::Passthrough);
}

#[tokio::test]
async fn test_preload_fills_the_cache_in_one_scan() {
    let (storage, store) = setup().await;
    let mut resolver = store.resolver(Some(SubjectId(1)));

    assert_eq!(resolver.preload().await.unwrap(), 4);
    assert_eq!(resolver.get("color").await.unwrap().as_deref(), Some("red"));
    assert_eq!(resolver.get("empty").await.unwrap().as_deref(), Some(""));
    assert_eq!(storage.finds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_relations_describe_aliased_joins() {
    let (_, store) = setup().await;
    let resolver = store.resolver(Some(SubjectId(1)));

    let join = resolver.relation("attrColor").unwrap();
    assert_eq!(join.alias(), "color");
    assert_eq!(join.foreign_key_field, "post_id");
    assert_eq!(
        join.to_sql(),
        "INNER JOIN \"post_meta\" AS \"color\" ON \"color\".\"post_id\" = \"post\".\"id\" AND \"color\".\"key\" = 'color'"
    );
    assert!(resolver.relation("author").is_none());
}

#[tokio::test]
async fn test_query_intersects_attribute_joins() {
    let (_, store) = setup().await;

    let with_size = store.query().join("color").join("size").fetch().await.unwrap();
    let ids: Vec<_> = with_size.iter().map(|row| row.subject_id).collect();
    assert_eq!(ids, vec![SubjectId(2), SubjectId(3)]);
    assert_eq!(with_size[0].values["color"].as_deref(), Some("blue"));
    assert_eq!(with_size[1].values["size"].as_deref(), Some("s"));

    let red = store
        .query()
        .join_where("color", ValueFilter::Equals("red".into()))
        .subject_ids()
        .await
        .unwrap();
    assert_eq!(red.into_iter().collect::<Vec<_>>(), vec![SubjectId(1), SubjectId(3)]);

    let red_sized = store
        .query()
        .join_where("color", ValueFilter::Equals("red".into()))
        .join("size")
        .subject_ids()
        .await
        .unwrap();
    assert_eq!(red_sized.len(), 1);
    assert!(red_sized.contains(&SubjectId(3)));
}
