//! Fixed-capacity string list used to pass filters, hashes, IPs and domains
//! into requests.
//!
//! # Design
//! A `BoundedList` owns exactly `capacity` slots. An empty slot is an empty
//! `String`; `add` writes into the first empty slot and never grows the list.
//! Entries are limited to `ENTRY_MAX_LEN - 2` (254) bytes, which keeps every
//! entry inside the C-side slot of `ENTRY_MAX_LEN` bytes with its terminator.

use crate::error::ListError;

/// Size of one list slot on the C side, terminator included.
pub const ENTRY_MAX_LEN: usize = 256;

/// Ordered, fixed-capacity collection of short strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedList {
    slots: Vec<String>,
}

impl BoundedList {
    /// Allocate a list with `capacity` empty slots. Returns `None` when
    /// `capacity` is zero.
    pub fn new(capacity: usize) -> Option<Self> {
        if capacity == 0 {
            return None;
        }
        Some(Self {
            slots: vec![String::new(); capacity],
        })
    }

    /// Store `value` in the first free slot.
    ///
    /// Duplicates are accepted. Fails when `value` is empty, when it is
    /// `ENTRY_MAX_LEN - 1` bytes or longer, or when every slot is taken.
    pub fn add(&mut self, value: &str) -> Result<(), ListError> {
        if value.is_empty() {
            return Err(ListError::Empty);
        }
        if value.len() >= ENTRY_MAX_LEN - 1 {
            return Err(ListError::TooLong {
                len: value.len(),
                max: ENTRY_MAX_LEN - 2,
            });
        }
        let capacity = self.capacity();
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.is_empty())
            .ok_or(ListError::Full { capacity })?;
        slot.push_str(value);
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Populated entries in slot order.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|slot| !slot.is_empty())
            .map(String::as_str)
    }

    pub(crate) fn to_vec(&self) -> Vec<String> {
        self.entries().map(str::to_owned).collect()
    }
}

/// Collect the populated entries of an optional list, or `None` when the list
/// is absent or holds nothing.
pub(crate) fn populated(list: Option<&BoundedList>) -> Option<Vec<String>> {
    list.map(BoundedList::to_vec).filter(|entries| !entries.is_empty())
}
