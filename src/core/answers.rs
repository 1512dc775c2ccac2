// src/core/answers.rs

use std::collections::BTreeSet;

/// Per-assessment record of the option indices selected for each presented
/// question. Membership is set-based: insertion order never matters and an
/// option is either in or out.
///
/// "Answered enough to submit" means a non-empty set, nothing stricter --
/// a multi-select question with three correct options counts as answered
/// after one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    slots: Vec<BTreeSet<usize>>,
}

impl AnswerSheet {
    /// A sheet with one empty slot per presented question.
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![BTreeSet::new(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Adds an option to a multi-select slot. Returns false for an
    /// out-of-bounds slot.
    pub fn toggle_on(&mut self, slot: usize, option: usize) -> bool {
        match self.slots.get_mut(slot) {
            Some(set) => {
                set.insert(option);
                true
            }
            None => false,
        }
    }

    /// Removes an option from a multi-select slot.
    pub fn toggle_off(&mut self, slot: usize, option: usize) -> bool {
        match self.slots.get_mut(slot) {
            Some(set) => {
                set.remove(&option);
                true
            }
            None => false,
        }
    }

    /// Single-select choice: replaces the whole slot with a singleton.
    pub fn choose_single(&mut self, slot: usize, option: usize) -> bool {
        match self.slots.get_mut(slot) {
            Some(set) => {
                set.clear();
                set.insert(option);
                true
            }
            None => false,
        }
    }

    pub fn selected(&self, slot: usize) -> Option<&BTreeSet<usize>> {
        self.slots.get(slot)
    }

    /// Lowest presentation index with an empty selection, if any. Drives
    /// the manual-submission gate: the client is sent back to this slot.
    pub fn first_unanswered(&self) -> Option<usize> {
        self.slots.iter().position(|set| set.is_empty())
    }

    pub fn is_complete(&self) -> bool {
        self.first_unanswered().is_none()
    }
}
