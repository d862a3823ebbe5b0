use hashbrown::HashMap;

/// Label table capacity.
pub const LABELS_MAX: usize = 256;

/// Represents labels of one translation: name to byte address.
///
/// Addresses are set once by [`LabelTable::define`] and never change.
///
/// # Example
/// ```
/// # use svm_as::labels::{LabelTable, LabelError};
/// #
/// let mut labels = LabelTable::new();
///
/// assert_eq!(labels.define("loop", 10), Ok(()));
/// assert_eq!(labels.define("loop", 20), Err(LabelError::Duplicate));
/// assert_eq!(labels.get("loop"), Some(10));
/// assert_eq!(labels.get("Loop"), None);
/// ```
#[derive(Default, Clone, Debug)]
pub struct LabelTable<'a> {
    labels: HashMap<&'a str, u32>,
}

/// Why a label could not be defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelError {
    /// Name is already defined.
    Duplicate,
    /// Table already holds [`LABELS_MAX`] labels.
    Full,
}

impl<'a> LabelTable<'a> {
    /// Creates empty table
    pub fn new() -> Self {
        Self {
            labels: HashMap::with_capacity(LABELS_MAX),
        }
    }

    /// Binds `name` to `address`.
    pub fn define(&mut self, name: &'a str, address: u32) -> Result<(), LabelError> {
        if self.labels.contains_key(name) {
            return Err(LabelError::Duplicate);
        }
        if self.labels.len() >= LABELS_MAX {
            return Err(LabelError::Full);
        }
        self.labels.insert(name, address);

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.labels.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates over `(name, address)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, u32)> + '_ {
        self.labels.iter().map(|(name, addr)| (*name, *addr))
    }
}
