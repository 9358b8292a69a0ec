//! Minimal RFC 8941 (Structured Field Values) encoding/decoding.
//!
//! Only the subset this protocol actually uses is implemented: bare booleans
//! (`?0`/`?1`), bare integers, and flat dictionaries of integer/boolean
//! members (as used by `Upload-Limit`). No parameters, strings, byte
//! sequences, decimals, tokens, or inner lists are supported.

use crate::error::ProtocolError;

/// A structured field value, restricted to the shapes this protocol uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// `?0` / `?1`.
    Boolean(bool),
    /// A bare, non-negative integer.
    Integer(u64),
}

impl Item {
    fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let raw = raw.trim();
        match raw {
            "?0" => Ok(Self::Boolean(false)),
            "?1" => Ok(Self::Boolean(true)),
            _ => raw
                .parse::<u64>()
                .map(Self::Integer)
                .map_err(|_| ProtocolError::InvalidStructuredValue("item")),
        }
    }

    fn format(&self) -> String {
        match self {
            Self::Boolean(false) => "?0".to_owned(),
            Self::Boolean(true) => "?1".to_owned(),
            Self::Integer(n) => n.to_string(),
        }
    }
}

/// Parses a bare SFV boolean (`?0` / `?1`).
pub fn parse_boolean(raw: &str) -> Result<bool, ProtocolError> {
    match Item::parse(raw)? {
        Item::Boolean(b) => Ok(b),
        Item::Integer(_) => Err(ProtocolError::InvalidStructuredValue("boolean")),
    }
}

/// Formats a bare SFV boolean.
#[must_use]
pub fn format_boolean(value: bool) -> String {
    Item::Boolean(value).format()
}

/// Parses a bare SFV integer (no leading `?`, no fractional part).
pub fn parse_integer(raw: &str) -> Result<u64, ProtocolError> {
    match Item::parse(raw)? {
        Item::Integer(n) => Ok(n),
        Item::Boolean(_) => Err(ProtocolError::InvalidStructuredValue("integer")),
    }
}

/// Formats a bare SFV integer.
#[must_use]
pub fn format_integer(value: u64) -> String {
    Item::Integer(value).format()
}

/// A flat SFV dictionary: an ordered list of `(key, item)` pairs.
///
/// RFC 8941 dictionaries preserve member order and allow duplicate keys to
/// shadow earlier ones; we keep the list representation rather than a map so
/// re-serialization is order-stable, matching §9's "ordered list of
/// `(name, value)`" modeling note for header dictionaries in general.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary(Vec<(String, Item)>);

impl Dictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts or replaces a member, preserving first-seen order on replace.
    pub fn insert(&mut self, key: impl Into<String>, item: Item) {
        let key = key.into();
        if let Some(existing) = self.0.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = item;
        } else {
            self.0.push((key, item));
        }
    }

    /// Looks up a member by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Item> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Parses a dictionary from its wire form, e.g. `max-size=100, min-size=0`.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::new());
        }
        let mut dict = Self::new();
        for member in raw.split(',') {
            let member = member.trim();
            let (key, value) = member
                .split_once('=')
                .ok_or(ProtocolError::InvalidStructuredValue("dictionary"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ProtocolError::InvalidStructuredValue("dictionary"));
            }
            dict.insert(key, Item::parse(value)?);
        }
        Ok(dict)
    }

    /// Serializes this dictionary back to its wire form.
    #[must_use]
    pub fn format(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{k}={}", v.format()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
