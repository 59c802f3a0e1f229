use crate::errors::{EmberError, EmberResult, ErrorKind};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone)]
struct BuildTicket {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

/// Per-field build guard.
///
/// At most one build per field holds a [BuildPermit] at any time. A second
/// acquisition for the same field fails immediately instead of queueing.
/// The permit releases the field when dropped, whether the build succeeded,
/// failed or panicked.
pub(crate) struct BuildTracker {
    builds: Arc<DashMap<String, BuildTicket>>,
    next_generation: AtomicU64,
}

impl BuildTracker {
    pub fn new() -> Self {
        BuildTracker {
            builds: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn try_acquire(&self, field: &str) -> EmberResult<BuildPermit> {
        match self.builds.entry(field.to_string()) {
            Entry::Occupied(_) => {
                log::error!("Index build already in progress for field {}", field);
                Err(EmberError::new(
                    &format!("index build already in progress for field {}", field),
                    ErrorKind::IndexingError,
                ))
            }
            Entry::Vacant(vacant) => {
                let ticket = BuildTicket {
                    generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
                    cancelled: Arc::new(AtomicBool::new(false)),
                };
                vacant.insert(ticket.clone());
                Ok(BuildPermit {
                    field: field.to_string(),
                    generation: ticket.generation,
                    cancelled: ticket.cancelled,
                    builds: self.builds.clone(),
                })
            }
        }
    }

    pub fn is_building(&self, field: &str) -> bool {
        self.builds.contains_key(field)
    }

    /// Releases the field and tells its in-flight build to discard its work.
    pub fn cancel(&self, field: &str) {
        if let Some((_, ticket)) = self.builds.remove(field) {
            ticket.cancelled.store(true, Ordering::Release);
            log::debug!("Cancelled index build for field {}", field);
        }
    }
}

/// Proof of exclusive build rights on one field.
pub(crate) struct BuildPermit {
    field: String,
    generation: u64,
    cancelled: Arc<AtomicBool>,
    builds: Arc<DashMap<String, BuildTicket>>,
}

impl BuildPermit {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for BuildPermit {
    fn drop(&mut self) {
        // a cancelled permit may have been superseded by a newer build
        let generation = self.generation;
        self.builds
            .remove_if(&self.field, |_, ticket| ticket.generation == generation);
    }
}
