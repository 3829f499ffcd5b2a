use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::transport::{OptionCode, OptionValue};

/// Options of a request, keyed by option code.
///
/// Iteration follows insertion order. Adding a code that is already present
/// replaces its value and keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionMap {
    entries: IndexMap<OptionCode, OptionValue>,
}

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, option: OptionCode, value: OptionValue) {
        self.entries.insert(option, value);
    }

    pub fn remove(&mut self, option: OptionCode) -> Option<OptionValue> {
        self.entries.shift_remove(&option)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, option: OptionCode) -> Option<&OptionValue> {
        self.entries.get(&option)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionCode, &OptionValue)> {
        self.entries.iter().map(|(option, value)| (*option, value))
    }
}

impl FromIterator<(OptionCode, OptionValue)> for OptionMap {
    fn from_iter<I: IntoIterator<Item = (OptionCode, OptionValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
