//! Untyped compose values and their coercion into canonical shapes.
//!
//! A compose document is a tree of scalars, sequences and mappings where
//! the same field may be written in several shapes. [`ComposeValue`] keeps
//! that tree as parsed; the `to_*` coercions turn a value into the single
//! shape the normalizer wants, or explain why the shape is malformed.

use std::collections::BTreeMap;

use dockyard_common::types::Arguments;
use indexmap::IndexMap;

use crate::error::ShapeError;

/// Outcome of a shape coercion.
pub type Coerced<T> = std::result::Result<T, ShapeError>;

/// A node of a parsed compose document.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposeValue {
    /// An explicit `~`/`null` or a key without a value.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// An integral number.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// A string scalar.
    String(String),
    /// An ordered sequence.
    Sequence(Vec<ComposeValue>),
    /// A mapping with string keys.
    Mapping(Mapping),
}

/// Insertion-ordered mapping with string keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: IndexMap<String, ComposeValue>,
}

impl Mapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`; an existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: ComposeValue) {
        let _ = self.entries.insert(key.into(), value);
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ComposeValue> {
        self.entries.get(key)
    }

    /// Iterates over the entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ComposeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over the keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ComposeValue)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, ComposeValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl From<&str> for ComposeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ComposeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ComposeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for ComposeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Mapping> for ComposeValue {
    fn from(value: Mapping) -> Self {
        Self::Mapping(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for ComposeValue {
    fn from(values: Vec<T>) -> Self {
        Self::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl ComposeValue {
    /// Short name of the value's shape, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Whether the value is `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the mapping if the value is one.
    #[must_use]
    pub const fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// Error for a value of the wrong kind.
    #[must_use]
    pub const fn unexpected(&self, expected: &'static str) -> ShapeError {
        ShapeError::Kind {
            expected,
            found: self.kind(),
        }
    }

    /// Returns the mapping, or a [`ShapeError::Kind`] naming `expected`.
    ///
    /// # Errors
    ///
    /// Fails for anything that is not a mapping.
    pub fn expect_mapping(&self, expected: &'static str) -> Coerced<&Mapping> {
        self.as_mapping().ok_or_else(|| self.unexpected(expected))
    }

    /// String form of a scalar; `None` for null, sequences and mappings.
    ///
    /// Floats keep their fractional part, so `2.0` reads as `"2.0"`.
    #[must_use]
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(format!("{f:?}")),
            Self::String(s) => Some(s.clone()),
            Self::Null | Self::Sequence(_) | Self::Mapping(_) => None,
        }
    }

    /// Coerces a scalar into a string.
    ///
    /// # Errors
    ///
    /// Fails for sequences, mappings and null.
    pub fn to_text(&self) -> Coerced<String> {
        self.scalar_text()
            .ok_or_else(|| self.unexpected("a scalar"))
    }

    /// Coerces a scalar or a sequence of scalars into a list of strings.
    ///
    /// # Errors
    ///
    /// Fails for mappings and for sequences holding non-scalar items.
    pub fn to_string_list(&self) -> Coerced<Vec<String>> {
        match self {
            Self::Null => Ok(Vec::new()),
            Self::Sequence(items) => items
                .iter()
                .map(|item| {
                    item.scalar_text()
                        .ok_or_else(|| item.unexpected("a list of scalars"))
                })
                .collect(),
            Self::Mapping(_) => Err(self.unexpected("a scalar or a list")),
            scalar => scalar.to_text().map(|text| vec![text]),
        }
    }

    /// Coerces a mapping or a sequence of `KEY=VALUE` strings into a map.
    ///
    /// Null mapping values and list entries without `=` map to an empty
    /// string. Later duplicates win.
    ///
    /// # Errors
    ///
    /// Fails for scalars, nested mapping values and non-scalar list items.
    pub fn to_string_map(&self) -> Coerced<BTreeMap<String, String>> {
        match self {
            Self::Null => Ok(BTreeMap::new()),
            Self::Mapping(mapping) => mapping
                .iter()
                .map(|(key, value)| {
                    let text = match value {
                        Self::Null => String::new(),
                        other => other
                            .scalar_text()
                            .ok_or_else(|| other.unexpected("a scalar").at(key))?,
                    };
                    Ok::<_, ShapeError>((key.to_owned(), text))
                })
                .collect(),
            Self::Sequence(items) => items
                .iter()
                .map(|item| {
                    let entry = item
                        .scalar_text()
                        .ok_or_else(|| item.unexpected("KEY=VALUE entries"))?;
                    Ok::<_, ShapeError>(match entry.split_once('=') {
                        Some((key, value)) => (key.to_owned(), value.to_owned()),
                        None => (entry, String::new()),
                    })
                })
                .collect(),
            scalar => Err(scalar.unexpected("a mapping or a list of KEY=VALUE entries")),
        }
    }

    /// Coerces a boolean or a boolean-like string.
    ///
    /// # Errors
    ///
    /// Fails for anything that is not `true`/`false`/`yes`/`no`.
    pub fn to_bool(&self) -> Coerced<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Ok(true),
                "false" | "no" | "off" => Ok(false),
                _ => Err(ShapeError::Text {
                    expected: "a boolean",
                    raw: s.clone(),
                }),
            },
            other => Err(other.unexpected("a boolean")),
        }
    }

    /// Coerces an integer.
    ///
    /// # Errors
    ///
    /// Fails for anything that is not an integer or an integral string.
    pub fn to_integer(&self) -> Coerced<i64> {
        match self {
            Self::Integer(i) => Ok(*i),
            Self::String(s) => s.trim().parse().map_err(|_| ShapeError::Text {
                expected: "an integer",
                raw: s.clone(),
            }),
            other => Err(other.unexpected("an integer")),
        }
    }

    /// Coerces a byte size such as `512`, `"64m"` or `"1gb"` into bytes.
    ///
    /// Units are binary multiples. The only negative value accepted is
    /// `-1`, passed through unchanged to mean unlimited.
    ///
    /// # Errors
    ///
    /// Fails for unknown units, non-numeric text, other negative values
    /// and overflowing values.
    pub fn to_byte_size(&self) -> Coerced<i64> {
        match self {
            Self::Integer(-1) => Ok(-1),
            Self::Integer(i) if *i < 0 => Err(ShapeError::OutOfRange { raw: i.to_string() }),
            Self::Integer(i) => Ok(*i),
            Self::String(s) => parse_byte_size(s),
            other => Err(other.unexpected("a byte size")),
        }
    }

    /// Coerces a command line: a string is shell form, a list is exec form.
    ///
    /// # Errors
    ///
    /// Fails for mappings, null and lists holding non-scalar items.
    pub fn to_arguments(&self) -> Coerced<Arguments> {
        match self {
            Self::Sequence(_) => self.to_string_list().map(Arguments::Exec),
            other => other.to_text().map(Arguments::Shell),
        }
    }
}

fn parse_byte_size(raw: &str) -> Coerced<i64> {
    let text = raw.trim().to_ascii_lowercase();
    if text == "-1" {
        return Ok(-1);
    }
    let digits_end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(digits_end);
    if number.is_empty() {
        return Err(if text.starts_with('-') {
            ShapeError::OutOfRange { raw: raw.to_owned() }
        } else {
            ShapeError::Text {
                expected: "a byte size",
                raw: raw.to_owned(),
            }
        });
    }
    let out_of_range = || ShapeError::OutOfRange { raw: raw.to_owned() };
    let number: i64 = number.parse().map_err(|_| out_of_range())?;
    let multiplier: i64 = match unit.trim() {
        "" | "b" => 1,
        "k" | "kb" => 1 << 10,
        "m" | "mb" => 1 << 20,
        "g" | "gb" => 1 << 30,
        other => {
            return Err(ShapeError::UnknownUnit {
                unit: other.to_owned(),
                raw: raw.to_owned(),
            });
        }
    };
    number.checked_mul(multiplier).ok_or_else(out_of_range)
}
