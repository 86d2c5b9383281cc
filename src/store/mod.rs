use thiserror::Error;

pub mod in_memory_store;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store is unavailable: {0}")]
    Unavailable(String),
    #[error("Read of `{key}` was invalidated by a concurrent commit")]
    Conflict { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub key: String,
    pub value: Vec<u8>,
}

/// Key-ordered cursor returned by [`StateStore::range_scan`].
///
/// The cursor holds a store resource until [`StateCursor::close`] is called,
/// so every caller has to close it, including when iteration fails.
pub trait StateCursor {
    fn next_entry(&mut self) -> Result<Option<StateEntry>, StoreError>;

    fn close(&mut self) -> Result<(), StoreError>;
}

/// The view of the store available to a single invocation.
///
/// Reads observe committed state only: a value written earlier in the same
/// invocation is not visible to a later `get`. Writes are staged, and the
/// caller running the invocation applies all of them at once, or none, when
/// it finishes.
pub trait StateStore {
    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    fn delete(&mut self, key: &str) -> Result<(), StoreError>;

    /// Opens a cursor over `[start, end)`. An empty bound leaves that side open.
    fn range_scan<'s>(
        &'s mut self,
        start: &str,
        end: &str,
    ) -> Result<Box<dyn StateCursor + 's>, StoreError>;
}
