//! Test repository: where generated tests live.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::model::{NewTest, Test};

/// Storage for generated tests.
///
/// `create` must allocate the id and append in one atomic step, so that
/// concurrent uploads never share or skip an id.
#[async_trait]
pub trait TestRepository: Send + Sync {
    /// Store a new test and return it with its allocated id.
    async fn create(&self, draft: NewTest) -> anyhow::Result<Arc<Test>>;

    /// All tests, oldest first.
    async fn list(&self) -> anyhow::Result<Vec<Arc<Test>>>;

    async fn get(&self, id: u64) -> anyhow::Result<Option<Arc<Test>>>;
}

#[derive(Debug)]
struct Inner {
    next_id: u64,
    tests: Vec<Arc<Test>>,
}

/// Process-lifetime repository. Everything is lost on restart.
#[derive(Debug)]
pub struct InMemoryTestStore {
    inner: Mutex<Inner>,
}

impl InMemoryTestStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                tests: Vec::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tests
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryTestStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TestRepository for InMemoryTestStore {
    async fn create(&self, draft: NewTest) -> anyhow::Result<Arc<Test>> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;
        let test = Arc::new(Test::from_draft(id, draft));
        inner.tests.push(Arc::clone(&test));
        Ok(test)
    }

    async fn list(&self) -> anyhow::Result<Vec<Arc<Test>>> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.tests.clone())
    }

    async fn get(&self, id: u64) -> anyhow::Result<Option<Arc<Test>>> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.tests.iter().find(|t| t.id == id).cloned())
    }
}
