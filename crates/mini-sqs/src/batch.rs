//! Splitting of batch operations into protocol-legal chunks.
//!
//! The service accepts at most [`MAX_BATCH_ENTRIES`] entries per batch call and
//! requires every entry to carry a unique `Id`. [`split_into_chunks`] takes an
//! arbitrarily long, ordered list of entries and returns consecutive chunks in
//! input order, assigning a fresh UUID to each entry that arrives without one.

use crate::error::SqsError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;

/// Maximum number of entries the service accepts in one batch request
pub const MAX_BATCH_ENTRIES: usize = 10;

/// An entry of a batch request that is correlated by an `Id`.
pub trait BatchEntry {
    fn entry_id(&self) -> Option<&str>;

    fn set_entry_id(&mut self, id: String);

    /// Assign a fresh identifier if the entry has none (or an empty one).
    ///
    /// Existing identifiers are left untouched.
    fn ensure_entry_id(&mut self) {
        if self.entry_id().map_or(true, str::is_empty) {
            self.set_entry_id(Uuid::new_v4().to_string());
        }
    }
}

/// Split `entries` into chunks of at most [`MAX_BATCH_ENTRIES`].
///
/// Entry `i` lands in chunk `i / MAX_BATCH_ENTRIES`; relative order is preserved.
/// Each entry is visited exactly once, so an identifier is assigned at most once.
pub fn split_into_chunks<T, I>(entries: I) -> Vec<Vec<T>>
where
    T: BatchEntry,
    I: IntoIterator<Item = T>,
{
    let mut chunks: Vec<Vec<T>> = Vec::new();

    for (index, mut entry) in entries.into_iter().enumerate() {
        entry.ensure_entry_id();

        if index % MAX_BATCH_ENTRIES == 0 {
            chunks.push(Vec::with_capacity(MAX_BATCH_ENTRIES));
        }

        if let Some(chunk) = chunks.last_mut() {
            chunk.push(entry);
        }
    }

    chunks
}

/// Decode batch entries from untyped JSON.
///
/// `what` names the parameter in the error message, e.g. `"messages"`.
///
/// # Errors
///
/// - `InvalidArgument` when `value` is not a JSON array
/// - `Serialization` when an element does not match `T`
pub fn entries_from_json<T>(value: Value, what: &str) -> Result<Vec<T>, SqsError>
where
    T: DeserializeOwned,
{
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(SqsError::from))
            .collect(),
        _ => Err(SqsError::InvalidArgument {
            message: format!("{} must be an array", what),
        }),
    }
}
