//! Schema Registry Tests
//!
//! End-to-end behaviour of the registry over a file-backed store:
//! - Conflicts and rejected definitions leave the schema untouched
//! - Type whitelist and systemLevel protection
//! - Every mutation is durable before it is visible
//! - Concurrent mutations are applied one at a time

use std::sync::Arc;
use std::time::Duration;

use dynaschema::records::ResourceKind;
use dynaschema::schema::{
    seed_document, FieldCatalog, FieldDefinition, FieldType, FileSchemaStore, MemorySchemaStore,
    ScalarType, SchemaDocument, SchemaErrorKind, SchemaRegistry, SchemaResult, SchemaStore,
    VersionTag,
};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_registry(document: &SchemaDocument) -> (TempDir, Arc<FileSchemaStore>, SchemaRegistry) {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(FileSchemaStore::new(tmp.path().join("productSchema.json")));
    store.create(document).unwrap();

    let registry = SchemaRegistry::open(store.clone()).unwrap();
    (tmp, store, registry)
}

fn sku_only() -> SchemaDocument {
    let mut fields = FieldCatalog::new();
    fields.insert("sku", FieldDefinition::new(FieldType::Scalar(ScalarType::String)));
    SchemaDocument::new("product", "products", "productsHistory", VersionTag::Number(1), fields)
}

// =============================================================================
// Add / Get
// =============================================================================

/// A string "true" flag is normalized to a boolean on the way in.
#[tokio::test]
async fn test_add_price_then_get_field() {
    let (_tmp, store, registry) = open_registry(&sku_only());

    registry
        .add_field("price", &json!({ "type": "Number", "required": "true" }))
        .await
        .unwrap();

    let snapshot = registry.get_field("price").unwrap();
    let price = snapshot.field("price").unwrap();
    assert_eq!(price.field_type, FieldType::Scalar(ScalarType::Number));
    assert!(price.required);
    assert!(!price.hidden);
    assert!(!price.system_level);

    // Persisted form carries a real boolean
    let raw = std::fs::read_to_string(store.path()).unwrap();
    let persisted: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted["schema"]["price"]["required"], json!(true));

    // getField returns the whole schema
    let names: Vec<_> = snapshot.fields.names().collect();
    assert_eq!(names, vec!["sku", "price"]);
}

#[tokio::test]
async fn test_add_existing_name_conflicts_and_keeps_schema() {
    let (_tmp, store, registry) = open_registry(&sku_only());
    let before = registry.get_schema();

    let err = registry
        .add_field("sku", &json!({ "type": "Number" }))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), SchemaErrorKind::Conflict);
    assert_eq!(registry.get_schema().document(), before.document());
    assert_eq!(&store.load().unwrap(), before.document());
}

#[tokio::test]
async fn test_type_whitelist() {
    let (_tmp, _store, registry) = open_registry(&sku_only());

    for bad in [
        json!({ "type": "Integer" }),
        json!({ "type": ["Number", "String"] }),
        json!({ "type": [] }),
        json!({ "type": "number" }),
        json!({ "type": { "of": "Number" } }),
        json!({ "required": true }),
    ] {
        let err = registry.add_field("qty", &bad).await.unwrap_err();
        assert_eq!(err.kind(), SchemaErrorKind::BadInput, "accepted {}", bad);
    }
    assert!(!registry.get_schema().fields.contains("qty"));

    registry.add_field("qty", &json!({ "type": "Number" })).await.unwrap();
    registry.add_field("sizes", &json!({ "type": ["Number"] })).await.unwrap();

    let schema = registry.get_schema();
    assert_eq!(schema.field("sizes").unwrap().field_type, FieldType::Array(ScalarType::Number));
}

// =============================================================================
// System-level protection
// =============================================================================

#[tokio::test]
async fn test_system_level_cannot_be_set_by_callers() {
    let (_tmp, _store, registry) = open_registry(&sku_only());

    let err = registry
        .add_field("audit", &json!({ "type": "String", "systemLevel": true }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), SchemaErrorKind::BadInput);

    let err = registry
        .update_field("sku", &json!({ "type": "String", "systemLevel": "true" }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), SchemaErrorKind::BadInput);
    assert!(!registry.get_schema().field("sku").unwrap().system_level);
}

#[tokio::test]
async fn test_seeded_identity_fields_are_locked() {
    let (_tmp, _store, registry) = open_registry(&seed_document(ResourceKind::Finance));

    for name in ["financeID", "version"] {
        let err = registry
            .update_field(name, &json!({ "type": "String" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), SchemaErrorKind::BadInput);

        let err = registry.delete_field(name).await.unwrap_err();
        assert_eq!(err.kind(), SchemaErrorKind::BadInput);
    }

    let err = registry
        .add_field("financeID", &json!({ "type": "String" }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), SchemaErrorKind::Conflict);
}

// =============================================================================
// Durability and visibility
// =============================================================================

/// getSchema after a mutation reflects exactly that mutation.
#[tokio::test]
async fn test_each_mutation_is_visible_and_durable() {
    let seed = seed_document(ResourceKind::Finance);
    let (_tmp, store, registry) = open_registry(&seed);

    registry.update_field("currency", &json!({ "type": "String", "required": true })).await.unwrap();
    let mut expected = seed.clone();
    expected.fields.insert(
        "currency",
        FieldDefinition::new(FieldType::Scalar(ScalarType::String)).required(),
    );
    assert_eq!(registry.get_schema().document(), &expected);
    assert_eq!(store.load().unwrap(), expected);

    registry.delete_field("tags").await.unwrap();
    expected.fields.remove("tags");
    assert_eq!(registry.get_schema().document(), &expected);
    assert_eq!(store.load().unwrap(), expected);

    assert_eq!(registry.revision(), 3);
}

#[tokio::test]
async fn test_reopen_sees_persisted_schema() {
    let (_tmp, store, registry) = open_registry(&sku_only());
    registry.add_field("price", &json!({ "type": "Number" })).await.unwrap();
    drop(registry);

    let reopened = SchemaRegistry::open(store).unwrap();
    assert!(reopened.get_schema().fields.contains("price"));
    assert_eq!(reopened.revision(), 1);
}

#[tokio::test]
async fn test_unwritable_store_keeps_old_schema_live() {
    let tmp = TempDir::new().unwrap();

    // A regular file where the schema directory should be
    let blocker = tmp.path().join("schema");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let registry = SchemaRegistry::open(Arc::new(BlockedStore {
        document: sku_only(),
        path: blocker.join("productSchema.json"),
    }))
    .unwrap();

    let err = registry
        .add_field("price", &json!({ "type": "Number" }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), SchemaErrorKind::Internal);
    assert!(!registry.get_schema().fields.contains("price"));
    assert_eq!(registry.revision(), 1);
}

/// Loads from memory, saves to a path that cannot be written.
struct BlockedStore {
    document: SchemaDocument,
    path: std::path::PathBuf,
}

impl SchemaStore for BlockedStore {
    fn load(&self) -> SchemaResult<SchemaDocument> {
        Ok(self.document.clone())
    }

    fn save(&self, document: &SchemaDocument) -> SchemaResult<()> {
        FileSchemaStore::new(&self.path).save(document)
    }
}

/// Saves only after a delay.
struct SlowStore {
    inner: MemorySchemaStore,
    delay: Duration,
}

impl SchemaStore for SlowStore {
    fn load(&self) -> SchemaResult<SchemaDocument> {
        self.inner.load()
    }

    fn save(&self, document: &SchemaDocument) -> SchemaResult<()> {
        std::thread::sleep(self.delay);
        self.inner.save(document)
    }
}

/// A caller that gives up mid-save does not leave disk and memory apart.
#[tokio::test]
async fn test_abandoned_mutation_is_still_promoted() {
    let store = Arc::new(SlowStore {
        inner: MemorySchemaStore::new(sku_only()),
        delay: Duration::from_millis(200),
    });
    let registry = SchemaRegistry::open(store.clone()).unwrap();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        registry.add_field("price", &json!({ "type": "Number" })),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(store.load().unwrap(), *registry.get_schema().document());
    assert!(registry.get_schema().fields.contains("price"));
    assert_eq!(registry.revision(), 2);

    // The next mutation builds on the promoted schema
    registry.add_field("qty", &json!({ "type": "Number" })).await.unwrap();
    let persisted = store.load().unwrap();
    assert!(persisted.fields.contains("price"));
    assert!(persisted.fields.contains("qty"));
    assert_eq!(registry.revision(), 3);
}

// =============================================================================
// Concurrency
// =============================================================================

/// Concurrent adds are serialized: none is lost, revisions are consecutive.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_are_all_applied() {
    let (_tmp, store, registry) = open_registry(&sku_only());
    let registry = Arc::new(registry);

    let mut handles = Vec::new();
    for i in 0..16 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            registry
                .add_field(&format!("attr{}", i), &json!({ "type": "String" }))
                .await
                .map(|snapshot| snapshot.revision())
        }));
    }

    let mut revisions = Vec::new();
    for handle in handles {
        revisions.push(handle.await.unwrap().unwrap());
    }
    revisions.sort_unstable();
    assert_eq!(revisions, (2..18).collect::<Vec<u64>>());

    let schema = registry.get_schema();
    assert_eq!(schema.fields.len(), 17);
    assert_eq!(store.load().unwrap(), *schema.document());
}

/// Racing adds of one name: exactly one wins.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_adds_of_same_name() {
    let (_tmp, _store, registry) = open_registry(&sku_only());
    let registry = Arc::new(registry);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            registry.add_field("price", &json!({ "type": "Number" })).await
        }));
    }

    let mut ok = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) if e.kind() == SchemaErrorKind::Conflict => conflicts += 1,
            Err(e) => panic!("unexpected error {}", e),
        }
    }
    assert_eq!((ok, conflicts), (1, 7));
}
