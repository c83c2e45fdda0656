// View generations - lets in-flight results for a superseded view be discarded
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Identifies one opening of a dashboard view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTicket {
    view_id: String,
    generation: u64,
}

impl ViewTicket {
    pub fn view_id(&self) -> &str {
        &self.view_id
    }
}

#[derive(Debug, Default)]
struct Generations {
    last_issued: u64,
    open: HashMap<String, u64>,
}

/// Tracks the latest opening of each view.
///
/// Generations come from one counter shared by all views, so a ticket is
/// never reissued. Opening a view again supersedes every earlier ticket for
/// it; results computed under a superseded ticket must not be applied.
/// Only views with an unreleased ticket hold an entry.
#[derive(Debug, Default)]
pub struct ViewTracker {
    generations: Mutex<Generations>,
}

impl ViewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, view_id: &str) -> ViewTicket {
        let mut generations = self.lock();
        generations.last_issued += 1;
        let generation = generations.last_issued;
        generations.open.insert(view_id.to_string(), generation);

        ViewTicket {
            view_id: view_id.to_string(),
            generation,
        }
    }

    pub fn is_current(&self, ticket: &ViewTicket) -> bool {
        self.lock().open.get(&ticket.view_id) == Some(&ticket.generation)
    }

    /// Closes the view if `ticket` is still its latest opening.
    pub fn release(&self, ticket: &ViewTicket) {
        let mut generations = self.lock();
        if generations.open.get(&ticket.view_id) == Some(&ticket.generation) {
            generations.open.remove(&ticket.view_id);
        }
    }

    #[cfg(test)]
    fn open_views(&self) -> usize {
        self.lock().open.len()
    }

    fn lock(&self) -> MutexGuard<'_, Generations> {
        // plain counters, still valid after poisoning
        self.generations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
