use super::types::Turn;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Arc<RwLock<Vec<Turn>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            turns: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add(&self, turn: Turn) {
        self.turns.write().push(turn);
    }

    pub fn get_all(&self) -> Vec<Turn> {
        self.turns.read().clone()
    }

    pub fn last(&self) -> Option<Turn> {
        self.turns.read().last().cloned()
    }

    pub fn clear(&self) {
        self.turns.write().clear();
    }

    pub fn len(&self) -> usize {
        self.turns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.read().is_empty()
    }
}
