//! Integration tests for cascading deletes over the in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use refdb_core::{
    Document, DocumentId, Filter, MemoryStore, Mutation, ReferenceDeclaration, SchemaRegistry,
    StoreDriver, StoreError, Value,
};
use refdb_engine::{CancelToken, DeleteOrchestrator, DeleteOutcome, Error};
use serde_json::json;

struct TestContext {
    store: Arc<MemoryStore>,
    orchestrator: DeleteOrchestrator,
}

impl TestContext {
    fn new(registry: SchemaRegistry) -> Self {
        let store = Arc::new(MemoryStore::new());
        let driver = Arc::clone(&store);
        let orchestrator = DeleteOrchestrator::new(Arc::new(registry), driver);
        Self {
            store,
            orchestrator,
        }
    }

    async fn count(&self, doc_type: &str) -> u64 {
        self.store.count(doc_type).await.unwrap()
    }

    async fn get(&self, doc_type: &str, id: DocumentId) -> Option<Document> {
        self.store
            .find(doc_type, &Filter::id(id))
            .await
            .unwrap()
            .into_iter()
            .next()
    }
}

fn thing_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.register("thing", vec![]).unwrap();
    registry
        .register(
            "referrer",
            vec![
                ReferenceDeclaration::scalar("thing_id", "thing"),
                ReferenceDeclaration::optional_scalar("optional_thing_id", "thing"),
                ReferenceDeclaration::scalar_list("thing_ids", "thing"),
                ReferenceDeclaration::embedded(
                    "hidden_thing",
                    vec![ReferenceDeclaration::scalar("thing_id", "thing")],
                ),
                ReferenceDeclaration::embedded_list(
                    "ordered_things",
                    vec![ReferenceDeclaration::scalar("thing_id", "thing")],
                    "order",
                ),
            ],
        )
        .unwrap();
    registry
}

fn ordered_thing(id: DocumentId, order: i64) -> Value {
    Value::Document(
        Document::new()
            .with("thing_id", id)
            .with("order", Value::Int(order)),
    )
}

/// Seed ten things and five referrers exercising every container shape.
async fn seed(ctx: &TestContext) -> (Vec<DocumentId>, Vec<DocumentId>) {
    let mut things = Vec::new();
    for i in 1..=10 {
        let doc = Document::from_json(&json!({ "something": format!("Thing{i}") })).unwrap();
        things.push(ctx.store.insert("thing", doc).await.unwrap());
    }

    let referrers = vec![
        Document::new().with("thing_id", things[1]),
        Document::new()
            .with("thing_id", things[0])
            .with("thing_ids", vec![Value::Id(things[2]), Value::Id(things[3])]),
        Document::new().with("thing_id", things[0]).with(
            "ordered_things",
            vec![ordered_thing(things[4], 0), ordered_thing(things[5], 1)],
        ),
        Document::new()
            .with("thing_id", things[0])
            .with("hidden_thing", Document::new().with("thing_id", things[6])),
        Document::new().with("optional_thing_id", things[1]),
    ];

    let mut referrer_ids = Vec::new();
    for doc in referrers {
        referrer_ids.push(ctx.store.insert("referrer", doc).await.unwrap());
    }
    (things, referrer_ids)
}

#[tokio::test]
async fn test_cascade_scenario() {
    let ctx = TestContext::new(thing_registry());
    let (things, referrers) = seed(&ctx).await;

    assert_eq!(ctx.count("referrer").await, 5);
    assert_eq!(ctx.count("thing").await, 10);

    // Scalar and optional-scalar references both delete their owners.
    let outcome = ctx.orchestrator.delete("thing", &things[1]).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(ctx.count("referrer").await, 3);
    assert_eq!(ctx.count("thing").await, 9);

    // Scalar-list reference: the value is pulled, the owner is kept.
    ctx.orchestrator.delete("thing", &things[2]).await.unwrap();
    assert_eq!(ctx.count("referrer").await, 3);
    assert_eq!(ctx.count("thing").await, 8);
    let r1 = ctx.get("referrer", referrers[1]).await.unwrap();
    assert_eq!(
        r1.get("thing_ids").unwrap().as_list().unwrap(),
        &[Value::Id(things[3])]
    );

    // Embedded-list reference: matching element removed, order renumbered.
    ctx.orchestrator.delete("thing", &things[4]).await.unwrap();
    assert_eq!(ctx.count("referrer").await, 3);
    assert_eq!(ctx.count("thing").await, 7);
    let r2 = ctx.get("referrer", referrers[2]).await.unwrap();
    let items = r2.get("ordered_things").unwrap().as_list().unwrap();
    assert_eq!(items.len(), 1);
    let survivor = items[0].as_document().unwrap();
    assert_eq!(survivor.get("thing_id").unwrap().as_id(), Some(things[5]));
    assert_eq!(survivor.get("order"), Some(&Value::Int(0)));

    // Embedded-single reference: the whole owner goes.
    ctx.orchestrator.delete("thing", &things[6]).await.unwrap();
    assert_eq!(ctx.count("referrer").await, 2);
    assert_eq!(ctx.count("thing").await, 6);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let ctx = TestContext::new(thing_registry());
    let (things, _) = seed(&ctx).await;

    let first = ctx.orchestrator.delete("thing", &things[1]).await.unwrap();
    assert_eq!(first, DeleteOutcome::Deleted);
    let referrers = ctx.count("referrer").await;
    let things_count = ctx.count("thing").await;

    let second = ctx.orchestrator.delete("thing", &things[1]).await.unwrap();
    assert_eq!(second, DeleteOutcome::NotFound);
    assert_eq!(ctx.count("referrer").await, referrers);
    assert_eq!(ctx.count("thing").await, things_count);
}

#[tokio::test]
async fn test_no_dangling_scalar_references_remain() {
    let ctx = TestContext::new(thing_registry());
    let (things, _) = seed(&ctx).await;

    ctx.orchestrator.delete("thing", &things[0]).await.unwrap();

    let dangling = ctx
        .store
        .find("referrer", &Filter::eq("thing_id", things[0]))
        .await
        .unwrap();
    assert!(dangling.is_empty());
}

#[tokio::test]
async fn test_dangling_references_repaired_when_root_missing() {
    // Convergent retry: the root was never stored, but referrers still
    // holding its id are repaired and the call reports NotFound.
    let ctx = TestContext::new(thing_registry());
    let ghost = DocumentId::generate();
    let keep = ctx
        .store
        .insert("thing", Document::new().with("something", "kept"))
        .await
        .unwrap();
    let owner = ctx
        .store
        .insert(
            "referrer",
            Document::new().with("thing_ids", vec![Value::Id(ghost), Value::Id(keep)]),
        )
        .await
        .unwrap();

    let outcome = ctx.orchestrator.delete("thing", &ghost).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::NotFound);

    let doc = ctx.get("referrer", owner).await.unwrap();
    assert_eq!(
        doc.get("thing_ids").unwrap().as_list().unwrap(),
        &[Value::Id(keep)]
    );
}

#[tokio::test]
async fn test_transitive_closure() {
    // Deleting a cascades to b, whose deletion cascades to c.
    let mut registry = SchemaRegistry::new();
    registry.register("a", vec![]).unwrap();
    registry
        .register("b", vec![ReferenceDeclaration::scalar("a_id", "a")])
        .unwrap();
    registry
        .register("c", vec![ReferenceDeclaration::scalar("b_id", "b")])
        .unwrap();
    let ctx = TestContext::new(registry);

    let a = ctx.store.insert("a", Document::new()).await.unwrap();
    let b = ctx
        .store
        .insert("b", Document::new().with("a_id", a))
        .await
        .unwrap();
    let c = ctx
        .store
        .insert("c", Document::new().with("b_id", b))
        .await
        .unwrap();

    let outcome = ctx.orchestrator.delete("a", &a).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(ctx.get("a", a).await.is_none());
    assert!(ctx.get("b", b).await.is_none());
    assert!(ctx.get("c", c).await.is_none());
}

#[tokio::test]
async fn test_cyclic_references_terminate() {
    let mut registry = SchemaRegistry::new();
    registry
        .register("x", vec![ReferenceDeclaration::scalar("y_id", "y")])
        .unwrap();
    registry
        .register("y", vec![ReferenceDeclaration::scalar("x_id", "x")])
        .unwrap();
    let ctx = TestContext::new(registry);

    let x = DocumentId::generate();
    let y = DocumentId::generate();
    ctx.store
        .insert("x", Document::new().with("id", x).with("y_id", y))
        .await
        .unwrap();
    ctx.store
        .insert("y", Document::new().with("id", y).with("x_id", x))
        .await
        .unwrap();

    let outcome = ctx.orchestrator.delete("x", &x).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(ctx.count("x").await, 0);
    assert_eq!(ctx.count("y").await, 0);
}

#[tokio::test]
async fn test_cancellation_reports_and_retry_converges() {
    let ctx = TestContext::new(thing_registry());
    let (things, _) = seed(&ctx).await;

    let cancel = CancelToken::new();
    cancel.cancel();
    let result = ctx
        .orchestrator
        .delete_with_cancel("thing", &things[1], &cancel)
        .await;
    assert!(matches!(result, Err(Error::Cancelled)));
    // Nothing ran, nothing was applied.
    assert_eq!(ctx.count("referrer").await, 5);

    // Retrying without the token finishes the work.
    ctx.orchestrator.delete("thing", &things[1]).await.unwrap();
    assert_eq!(ctx.count("referrer").await, 3);
}

/// Requests cancellation after a fixed number of `find` calls, simulating
/// an operator cancelling a delete that is already part-way through.
struct CancellingStore {
    inner: MemoryStore,
    cancel: CancelToken,
    finds: AtomicUsize,
    trip_after: usize,
}

#[async_trait]
impl StoreDriver for CancellingStore {
    async fn find(&self, doc_type: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        if self.finds.fetch_add(1, Ordering::SeqCst) + 1 == self.trip_after {
            self.cancel.cancel();
        }
        self.inner.find(doc_type, filter).await
    }

    async fn update(
        &self,
        doc_type: &str,
        filter: &Filter,
        mutation: &Mutation,
    ) -> Result<u64, StoreError> {
        self.inner.update(doc_type, filter, mutation).await
    }

    async fn delete_one(&self, doc_type: &str, filter: &Filter) -> Result<bool, StoreError> {
        self.inner.delete_one(doc_type, filter).await
    }

    async fn insert(&self, doc_type: &str, doc: Document) -> Result<DocumentId, StoreError> {
        self.inner.insert(doc_type, doc).await
    }

    async fn count(&self, doc_type: &str) -> Result<u64, StoreError> {
        self.inner.count(doc_type).await
    }
}

#[tokio::test]
async fn test_mid_cascade_cancellation_retains_applied_repairs() {
    let inner = MemoryStore::new();
    let thing = inner.insert("thing", Document::new()).await.unwrap();
    inner
        .insert("referrer", Document::new().with("thing_id", thing))
        .await
        .unwrap();
    inner
        .insert("referrer", Document::new().with("optional_thing_id", thing))
        .await
        .unwrap();

    // The second owner lookup trips the token: by then the first owner is
    // already deleted and the second is still pending.
    let cancel = CancelToken::new();
    let store = Arc::new(CancellingStore {
        inner,
        cancel: cancel.clone(),
        finds: AtomicUsize::new(0),
        trip_after: 2,
    });
    let driver = Arc::clone(&store);
    let orchestrator = DeleteOrchestrator::new(Arc::new(thing_registry()), driver);

    let result = orchestrator.delete_with_cancel("thing", &thing, &cancel).await;
    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(store.count("referrer").await.unwrap(), 1);
    assert_eq!(store.count("thing").await.unwrap(), 1);

    // A fresh invocation finishes the remaining work.
    let outcome = orchestrator.delete("thing", &thing).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(store.count("referrer").await.unwrap(), 0);
    assert_eq!(store.count("thing").await.unwrap(), 0);
}

#[tokio::test]
async fn test_owner_with_emptied_embedded_list_persists() {
    let ctx = TestContext::new(thing_registry());
    let thing = ctx.store.insert("thing", Document::new()).await.unwrap();
    let owner = ctx
        .store
        .insert(
            "referrer",
            Document::new().with("ordered_things", vec![ordered_thing(thing, 0)]),
        )
        .await
        .unwrap();

    ctx.orchestrator.delete("thing", &thing).await.unwrap();

    let doc = ctx.get("referrer", owner).await.unwrap();
    assert!(doc
        .get("ordered_things")
        .unwrap()
        .as_list()
        .unwrap()
        .is_empty());
}
