// src/sessions.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::core::answers::AnswerSheet;

/// In-memory store of live answer sheets, keyed by assessment id.
///
/// Selected-answer sets are deliberately never persisted: they exist only
/// between "begin assessment" and submission, after which the graded
/// Result is the durable record. A sheet lost to a restart is re-created
/// empty when the assessment is next fetched.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, AnswerSheet>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh sheet, replacing any previous one for the id.
    pub fn register(&self, assessment_id: &str, sheet: AnswerSheet) {
        self.lock().insert(assessment_id.to_owned(), sheet);
    }

    /// Creates an empty sheet for the id unless one is already live.
    /// A single lock acquisition, so concurrent callers can never clobber
    /// a sheet that another request just populated.
    pub fn register_if_absent(&self, assessment_id: &str, slots: usize) {
        self.lock()
            .entry(assessment_id.to_owned())
            .or_insert_with(|| AnswerSheet::new(slots));
    }

    /// Runs a closure against the live sheet, if one exists.
    pub fn with_sheet<R>(
        &self,
        assessment_id: &str,
        f: impl FnOnce(&mut AnswerSheet) -> R,
    ) -> Option<R> {
        self.lock().get_mut(assessment_id).map(f)
    }

    pub fn contains(&self, assessment_id: &str) -> bool {
        self.lock().contains_key(assessment_id)
    }

    pub fn snapshot(&self, assessment_id: &str) -> Option<AnswerSheet> {
        self.lock().get(assessment_id).cloned()
    }

    /// Drains the sheet on submission.
    pub fn remove(&self, assessment_id: &str) -> Option<AnswerSheet> {
        self.lock().remove(assessment_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, AnswerSheet>> {
        self.inner.lock().expect("session store mutex poisoned")
    }
}
