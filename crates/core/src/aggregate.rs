use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{Result, TreemapError};
use crate::model::Record;

/// Groups in the order their key was first seen. Items keep input order
/// within a group.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped<K, T = Record> {
    groups: Vec<(K, Vec<T>)>,
}

impl<K, T> Grouped<K, T> {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.groups.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[T])> {
        self.groups.iter().map(|(k, items)| (k, items.as_slice()))
    }

    pub fn get(&self, key: &K) -> Option<&[T]>
    where
        K: PartialEq,
    {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, items)| items.as_slice())
    }
}

impl<K, T> IntoIterator for Grouped<K, T> {
    type Item = (K, Vec<T>);
    type IntoIter = std::vec::IntoIter<(K, Vec<T>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Bucket `items` by `key_fn`. No value-based sorting happens here.
pub fn group_by<T, K, F>(items: impl IntoIterator<Item = T>, mut key_fn: F) -> Result<Grouped<K, T>>
where
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> K,
{
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    let mut slot_by_key: HashMap<K, usize> = HashMap::new();

    for item in items {
        let key = key_fn(&item);
        match slot_by_key.get(&key) {
            Some(&slot) => groups[slot].1.push(item),
            None => {
                slot_by_key.insert(key.clone(), groups.len());
                groups.push((key, vec![item]));
            }
        }
    }

    if groups.is_empty() {
        return Err(TreemapError::EmptyInput);
    }
    tracing::debug!("grouped into {} buckets", groups.len());
    Ok(Grouped { groups })
}

/// The grouping the treemap uses: records by region.
pub fn by_region(records: impl IntoIterator<Item = Record>) -> Result<Grouped<String>> {
    group_by(records, |r: &Record| r.region.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_first_occurrence() {
        let records = vec![
            Record::new("KEN", "Africa"),
            Record::new("FRA", "Europe"),
            Record::new("NGA", "Africa"),
            Record::new("JPN", "Asia"),
            Record::new("DEU", "Europe"),
        ];
        let grouped = by_region(records).unwrap();
        let keys: Vec<_> = grouped.keys().cloned().collect();
        assert_eq!(keys, ["Africa", "Europe", "Asia"]);

        let africa: Vec<_> = grouped
            .get(&"Africa".to_string())
            .unwrap()
            .iter()
            .map(|r| r.country_code.as_str())
            .collect();
        assert_eq!(africa, ["KEN", "NGA"]);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = by_region(Vec::new()).unwrap_err();
        assert_eq!(err, TreemapError::EmptyInput);
    }

    #[test]
    fn works_for_any_key() {
        let grouped = group_by(1..=6, |n| n % 3).unwrap();
        let collected: Vec<_> = grouped.into_iter().collect();
        assert_eq!(collected, vec![(1, vec![1, 4]), (2, vec![2, 5]), (0, vec![3, 6])]);
    }
}
