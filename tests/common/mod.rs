//! Shared fixtures for the integration tests.

use std::sync::Arc;

use permbase::prelude::*;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
}

impl Record for User {
    fn record_id(&self) -> Option<RecordId> {
        self.id.map(RecordId::from)
    }
}

impl Entity for User {
    const NAME: &'static str = "User";
    const STORAGE_NAME: &'static str = "user";
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: Option<i64>,
    pub title: String,
}

impl Record for Post {
    fn record_id(&self) -> Option<RecordId> {
        self.id.map(RecordId::from)
    }
}

impl Entity for Post {
    const NAME: &'static str = "Post";
    const STORAGE_NAME: &'static str = "post";
}

pub struct Fixture {
    pub registry: Arc<Registry>,
    pub store: MemoryStore,
    pub manager: PermissionManager<MemoryStore>,
    pub user: User,
    pub post: Post,
}

/// Registry with `User` agents and `Post` targets over a fresh in-memory
/// store, seeded with one user and one post.
pub fn fixture() -> Fixture {
    init_logging();

    let mut registry = Registry::new();
    registry.register_agent::<User>();
    registry.register_target::<Post>();
    registry
        .make_schemas(&RelationSchemaFactory::new())
        .expect("schema creation");
    let registry = Arc::new(registry);

    let store = MemoryStore::new();
    let user = User {
        id: Some(1),
        name: "freddie".to_string(),
    };
    let post = Post {
        id: Some(1),
        title: "death on two legs".to_string(),
    };
    store.put(user.clone()).expect("store user");
    store.put(post.clone()).expect("store post");

    let manager = PermissionManager::new(Arc::clone(&registry), store.clone());
    Fixture {
        registry,
        store,
        manager,
        user,
        post,
    }
}
