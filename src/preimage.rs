use std::{collections::HashMap, ops::Range};

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::lookup2;

/// The prefix of every string table key, the id follows without separator.
pub const DEFAULT_PREFIX: &str = "Global.Text.";

/// Builds the key string that was hashed for a given id, e.g. `Global.Text.42`.
#[derive(Debug, Clone)]
pub struct KeyTemplate {
    prefix: String,
}

impl KeyTemplate {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Writes the key for `id` into `buf`, replacing its previous content.
    pub fn write_key(&self, id: u32, buf: &mut Vec<u8>) {
        buf.clear();
        buf.extend_from_slice(self.prefix.as_bytes());

        let digits_start = buf.len();
        let mut value = id;
        loop {
            buf.push(b'0' + (value % 10) as u8);
            value /= 10;
            if value == 0 {
                break;
            }
        }
        buf[digits_start..].reverse();
    }

    pub fn key(&self, id: u32) -> String {
        format!("{}{}", self.prefix, id)
    }
}

impl Default for KeyTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Maps the hash of every key in a range of ids back to its id.
#[derive(Debug, Default)]
pub struct PreimageTable(HashMap<u32, u32>);

impl PreimageTable {
    /// Hashes every id in `range` with lookup2.
    pub fn build(range: Range<u32>, template: &KeyTemplate, initval: u32) -> Self {
        Self::build_with(range, template, |key| lookup2::hash(key, initval))
    }

    /// Hashes every id in `range` with the given hash function.
    ///
    /// If two ids produce the same hash, the larger one is kept, exactly as if the ids
    /// had been inserted one after another in ascending order.
    pub fn build_with<H>(range: Range<u32>, template: &KeyTemplate, hasher: H) -> Self
    where
        H: Fn(&[u8]) -> u32 + Sync,
    {
        if range.is_empty() {
            return Self::default();
        }

        let table = range
            .into_par_iter()
            .fold(
                || (Vec::with_capacity(32), HashMap::new()),
                |(mut key, mut partial), id| {
                    template.write_key(id, &mut key);
                    partial.insert(hasher(key.as_slice()), id);
                    (key, partial)
                },
            )
            .map(|(_, partial)| partial)
            // rayon hands the halves over in order, so the right side holds the larger ids
            .reduce(HashMap::new, |mut left, right| {
                left.extend(right);
                left
            });

        Self(table)
    }

    pub fn get(&self, hash: u32) -> Option<u32> {
        self.0.get(&hash).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
