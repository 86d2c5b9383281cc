use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::{Span, debug};

use super::{StateCursor, StateEntry, StateStore, StoreError};

#[derive(Debug, Default)]
struct CommittedState {
    values: BTreeMap<String, Vec<u8>>,
    // survives deletes, so a delete followed by a re-create is still a change
    versions: HashMap<String, u64>,
    open_cursors: usize,
}

impl CommittedState {
    fn version(&self, key: &str) -> u64 {
        self.versions.get(key).copied().unwrap_or_default()
    }
}

/// Committed key-value state shared by concurrent invocations.
///
/// Each invocation works through its own [`StagedTransaction`]. Conflicts
/// between invocations are detected when they commit, by comparing the
/// versions of every key they read.
#[derive(Debug)]
pub struct InMemoryStore {
    state: Mutex<CommittedState>,
    span: Span,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_span(Span::none())
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose events are recorded under `span`.
    pub fn with_span(span: Span) -> Self {
        Self {
            state: Mutex::default(),
            span,
        }
    }

    pub fn begin(&self) -> StagedTransaction<'_> {
        StagedTransaction {
            store: self,
            read_set: HashMap::new(),
            write_set: BTreeMap::new(),
        }
    }

    /// Number of cursors handed out and not closed yet.
    pub fn open_cursors(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .open_cursors
    }

    fn lock(&self) -> Result<MutexGuard<'_, CommittedState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }
}

#[derive(Debug)]
enum StagedWrite {
    Put(Vec<u8>),
    Delete,
}

/// Writes staged by one invocation, plus the versions of everything it read.
///
/// Dropping the transaction without calling [`StagedTransaction::commit`]
/// discards the staged writes.
#[derive(Debug)]
pub struct StagedTransaction<'a> {
    store: &'a InMemoryStore,
    read_set: HashMap<String, u64>,
    write_set: BTreeMap<String, StagedWrite>,
}

impl StagedTransaction<'_> {
    pub fn staged_writes(&self) -> usize {
        self.write_set.len()
    }

    /// Validates the read set and applies every staged write as one unit.
    pub fn commit(self) -> Result<(), StoreError> {
        let store = self.store;
        let mut state = store.lock()?;
        for (key, version) in &self.read_set {
            if state.version(key) != *version {
                return Err(StoreError::Conflict { key: key.clone() });
            }
        }

        let writes = self.write_set.len();
        for (key, write) in self.write_set {
            match write {
                StagedWrite::Put(value) => {
                    state.values.insert(key.clone(), value);
                }
                StagedWrite::Delete => {
                    state.values.remove(&key);
                }
            }
            *state.versions.entry(key).or_default() += 1;
        }
        debug!(
            parent: &store.span,
            writes,
            reads = self.read_set.len(),
            "committed staged writes"
        );
        Ok(())
    }

    fn observe(read_set: &mut HashMap<String, u64>, key: &str, version: u64) {
        // the first observation is the one the invocation acted on
        read_set.entry(key.to_string()).or_insert(version);
    }
}

impl StateStore for StagedTransaction<'_> {
    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let state = self.store.lock()?;
        Self::observe(&mut self.read_set, key, state.version(key));
        Ok(state.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.write_set
            .insert(key.to_string(), StagedWrite::Put(value));
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.write_set.insert(key.to_string(), StagedWrite::Delete);
        Ok(())
    }

    fn range_scan<'s>(
        &'s mut self,
        start: &str,
        end: &str,
    ) -> Result<Box<dyn StateCursor + 's>, StoreError> {
        let store = self.store;
        let mut state = store.lock()?;

        let entries: Vec<StateEntry> = if !end.is_empty() && start > end {
            Vec::new()
        } else {
            let upper = if end.is_empty() {
                Bound::Unbounded
            } else {
                Bound::Excluded(end)
            };
            state
                .values
                .range::<str, _>((Bound::Included(start), upper))
                .map(|(key, value)| StateEntry {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect()
        };
        for entry in &entries {
            Self::observe(&mut self.read_set, &entry.key, state.version(&entry.key));
        }
        state.open_cursors += 1;
        debug!(
            parent: &store.span,
            start,
            end,
            entries = entries.len(),
            "opened range cursor"
        );

        Ok(Box::new(SnapshotCursor {
            store,
            entries: entries.into_iter(),
            open: true,
        }))
    }
}

/// Cursor over the committed entries in range at the time it was opened.
struct SnapshotCursor<'a> {
    store: &'a InMemoryStore,
    entries: std::vec::IntoIter<StateEntry>,
    open: bool,
}

impl StateCursor for SnapshotCursor<'_> {
    fn next_entry(&mut self) -> Result<Option<StateEntry>, StoreError> {
        if !self.open {
            return Err(StoreError::Unavailable("cursor is closed".to_string()));
        }
        Ok(self.entries.next())
    }

    fn close(&mut self) -> Result<(), StoreError> {
        if self.open {
            let mut state = self.store.lock()?;
            state.open_cursors -= 1;
            self.open = false;
        }
        Ok(())
    }
}
