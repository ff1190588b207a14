//! Result storage for simulation runs.

use dashmap::DashMap;

use preflight_types::testing::TestResult;

/// Store of completed test results, keyed by execution id.
///
/// Results are immutable once inserted; an insert under an existing key
/// is ignored rather than overwriting history.
pub trait ResultStore: Send + Sync {
    fn insert(&self, result: TestResult);
    fn get(&self, execution_id: &str) -> Option<TestResult>;
    fn list(&self) -> Vec<TestResult>;
}

/// Concurrent in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: DashMap<String, TestResult>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for InMemoryResultStore {
    fn insert(&self, result: TestResult) {
        self.results
            .entry(result.execution_id.clone())
            .or_insert(result);
    }

    fn get(&self, execution_id: &str) -> Option<TestResult> {
        self.results.get(execution_id).map(|r| r.clone())
    }

    fn list(&self) -> Vec<TestResult> {
        self.results.iter().map(|r| r.clone()).collect()
    }
}
