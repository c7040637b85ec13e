//! Content-addressed identity for cart lines.
//!
//! Two lines are the same cart line iff they share an item id and the
//! canonical form of their customization. The canonical form must not
//! depend on the order in which the user picked options, so option names
//! are sorted before hashing. An absent customization and an empty one
//! produce the same key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of a single customization option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Text(String),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Flag(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

/// Named modifiers attached to a cart line (e.g. no-sugar, extra chilli,
/// free-text notes), kept in the order the user picked them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Customization(Vec<(String, OptionValue)>);

impl Customization {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a boolean option.
    pub fn flag(mut self, name: &str, on: bool) -> Self {
        self.set(name, OptionValue::Flag(on));
        self
    }

    /// Builder: set a free-text option.
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, OptionValue::Text(value.into()));
        self
    }

    /// Set an option, replacing any earlier value under the same name.
    pub fn set(&mut self, name: &str, value: impl Into<OptionValue>) {
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name.to_string(), value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Options in pick order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Options sorted by name, for canonical display and hashing.
    pub fn sorted(&self) -> Vec<(&str, &OptionValue)> {
        let map: BTreeMap<&str, &OptionValue> =
            self.0.iter().map(|(n, v)| (n.as_str(), v)).collect();
        map.into_iter().collect()
    }
}

/// Derive the stable key for a customization.
///
/// Deterministic and order-independent over option names: permutations of
/// the same option set hash identically. `None` and an empty customization
/// are equivalent.
pub fn customization_key(customization: Option<&Customization>) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();

    if let Some(custom) = customization {
        for (name, value) in custom.sorted() {
            hasher.update(name.as_bytes());
            hasher.update([0x1e]);
            match value {
                OptionValue::Flag(on) => hasher.update([if *on { 1u8 } else { 0u8 }]),
                OptionValue::Text(text) => hasher.update(text.as_bytes()),
            }
            hasher.update([0x1f]);
        }
    }

    let result = hasher.finalize();
    hex::encode(&result[..16])
}
