use std::collections::BTreeMap;

use indexmap::IndexSet;

use crate::{
    preimage::PreimageTable,
    records::{HashKey, InputRecord},
};

/// Label of the diagnostic line listing the unresolved hashes.
pub const UNRESOLVED_LABEL: &str = "Could not look up hashes:";

/// Hashes without a matching id, deduplicated and in the order they were first seen.
#[derive(Debug, Default)]
pub struct UnresolvedSet(IndexSet<HashKey>);

impl UnresolvedSet {
    /// Returns false if the key was already present.
    pub fn insert(&mut self, key: HashKey) -> bool {
        self.0.insert(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HashKey> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The diagnostic line, e.g. `Could not look up hashes: ff 3b9ac9ff`.
    pub fn report(&self) -> String {
        let mut report = UNRESOLVED_LABEL.to_string();
        for key in self.iter() {
            report.push(' ');
            report.push_str(&key.to_string());
        }
        report
    }
}

/// The outcome of resolving all records against a preimage table.
#[derive(Debug, Default)]
pub struct Resolution<'a> {
    resolved: BTreeMap<u32, &'a str>,
    unresolved: UnresolvedSet,
}

impl<'a> Resolution<'a> {
    /// Resolved texts by id, in ascending id order.
    pub fn resolved(&self) -> &BTreeMap<u32, &'a str> {
        &self.resolved
    }

    pub fn unresolved(&self) -> &UnresolvedSet {
        &self.unresolved
    }

    /// Serializes the resolved entries as `id\ttext\n` lines.
    pub fn to_output(&self) -> String {
        let mut output = String::new();
        for (id, text) in &self.resolved {
            output.push_str(&id.to_string());
            output.push('\t');
            output.push_str(text);
            output.push('\n');
        }
        output
    }
}

/// Looks up every record in the table, a later record for the same id replaces an earlier one.
pub fn resolve<'a, I>(table: &PreimageTable, records: I) -> Resolution<'a>
where
    I: IntoIterator<Item = InputRecord<'a>>,
{
    let mut resolution = Resolution::default();
    for record in records {
        match record.hash.as_hash().and_then(|hash| table.get(hash)) {
            Some(id) => {
                if let Some(previous) = resolution.resolved.insert(id, record.text) {
                    log::debug!("id {} resolved twice, replacing {:?}", id, previous);
                }
            }
            None => {
                resolution.unresolved.insert(record.hash);
            }
        }
    }
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lookup2, preimage::KeyTemplate, records::parse_records};

    fn hash_of(id: u32) -> u32 {
        lookup2::hash(KeyTemplate::default().key(id).as_bytes(), 0)
    }

    fn table(range: std::ops::Range<u32>) -> PreimageTable {
        PreimageTable::build(range, &KeyTemplate::default(), 0)
    }

    #[test]
    fn resolves_hits() {
        let input = format!("{}\tX\tHello\r\n{}\tY\tWorld", hash_of(42), hash_of(40));
        let resolution = resolve(&table(40..50), parse_records(&input));
        assert_eq!(resolution.to_output(), "40\tWorld\n42\tHello\n");
        assert!(resolution.unresolved().is_empty());
        assert_eq!(resolution.unresolved().report(), "Could not look up hashes:");
    }

    #[test]
    fn round_trip_over_a_range() {
        let input = (100..200)
            .map(|id| format!("{}\t_\ttext {}", hash_of(id), id))
            .collect::<Vec<_>>()
            .join("\r\n");
        let resolution = resolve(&table(0..1000), parse_records(&input));
        assert_eq!(resolution.resolved().len(), 100);
        for id in 100..200 {
            assert_eq!(resolution.resolved()[&id], format!("text {}", id));
        }
    }

    #[test]
    fn reports_misses_in_hex() {
        let records = vec![
            InputRecord::parse("255\t_\tmissing"),
            InputRecord::parse("999999999\t_\tmissing"),
            InputRecord::parse("255\t_\tmissing again"),
        ];
        let resolution = resolve(&table(0..10), records);
        assert!(resolution.resolved().is_empty());
        assert_eq!(resolution.to_output(), "");
        assert_eq!(resolution.unresolved().len(), 2);
        assert_eq!(
            resolution.unresolved().report(),
            "Could not look up hashes: ff 3b9ac9ff"
        );
    }

    #[test]
    fn malformed_lines_are_reported_once() {
        let input = format!("not a hash\t_\tfoo\r\n{}\t_\tbar\r\n\r\n", hash_of(3));
        let resolution = resolve(&table(0..10), parse_records(&input));
        assert_eq!(resolution.to_output(), "3\tbar\n");
        let unresolved: Vec<_> = resolution.unresolved().iter().copied().collect();
        assert_eq!(unresolved, vec![HashKey::Malformed]);
        assert_eq!(
            resolution.unresolved().report(),
            "Could not look up hashes: NaN"
        );
    }

    #[test]
    fn unresolved_set_keeps_first_seen_order() {
        let mut unresolved = UnresolvedSet::default();
        assert!(unresolved.insert(HashKey::Value(16)));
        assert!(unresolved.insert(HashKey::Malformed));
        assert!(unresolved.insert(HashKey::Value(1)));
        assert!(!unresolved.insert(HashKey::Value(16)));
        assert!(!unresolved.insert(HashKey::Malformed));

        assert_eq!(unresolved.len(), 3);
        assert_eq!(unresolved.report(), "Could not look up hashes: 10 NaN 1");
    }

    #[test]
    fn missing_text_resolves_to_empty() {
        let input = hash_of(7).to_string();
        let resolution = resolve(&table(0..10), parse_records(&input));
        assert_eq!(resolution.to_output(), "7\t\n");
    }

    #[test]
    fn later_records_overwrite() {
        let input = format!("{0}\t_\tfirst\r\n{0}\t_\tsecond", hash_of(5));
        let resolution = resolve(&table(5..6), parse_records(&input));
        assert_eq!(resolution.to_output(), "5\tsecond\n");
    }

    #[test]
    fn leading_zeros_resolve() {
        let input = format!("000{}\t_\tpadded", hash_of(8));
        let resolution = resolve(&table(0..10), parse_records(&input));
        assert_eq!(resolution.to_output(), "8\tpadded\n");
    }

    #[test]
    fn range_end_is_excluded() {
        let input = format!("{}\t_\tfive\r\n{}\t_\tsix", hash_of(5), hash_of(6));
        let resolution = resolve(&table(5..6), parse_records(&input));
        assert_eq!(resolution.to_output(), "5\tfive\n");
        assert_eq!(
            resolution.unresolved().report(),
            format!("Could not look up hashes: {:x}", hash_of(6))
        );
    }
}
