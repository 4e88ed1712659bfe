use crate::domain::{ContextKey, ResultRecord};
use std::collections::HashMap;

/// Append-only result logs, one per context key.
///
/// Hidden contexts keep their logs untouched; switching only changes which key is read.
#[derive(Clone, Debug)]
pub struct ScrollbackStore {
    logs: HashMap<ContextKey, Vec<ResultRecord>>,
    active: ContextKey,
}

impl ScrollbackStore {
    pub fn new(active: ContextKey) -> Self {
        Self {
            logs: HashMap::new(),
            active,
        }
    }

    pub fn active_key(&self) -> &ContextKey {
        &self.active
    }

    pub fn append(&mut self, context: &ContextKey, result: ResultRecord) {
        self.logs.entry(context.clone()).or_default().push(result);
    }

    pub fn get_active(&self, context: &ContextKey) -> &[ResultRecord] {
        self.logs.get(context).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn visible(&self) -> &[ResultRecord] {
        self.get_active(&self.active)
    }

    pub fn switch_context(&mut self, old: &ContextKey, new: ContextKey) {
        if old != &new {
            tracing::debug!(
                from = %old,
                to = %new,
                contexts = self.context_count(),
                "switching scrollback context"
            );
        }
        self.active = new;
    }

    pub fn context_count(&self) -> usize {
        self.logs.len()
    }
}
