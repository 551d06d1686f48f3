use super::domain::round_half_up;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sticky minimum-DKP thresholds keyed by player ID.
///
/// An entry is written the first time a player is scored and is never
/// recomputed afterwards; only [`MinDkpMap::clear`] resets the baselines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, i64>")]
pub struct MinDkpMap {
    entries: BTreeMap<String, i64>,
}

impl MinDkpMap {
    pub fn get(&self, player_id: &str) -> Option<i64> {
        self.entries.get(player_id).copied()
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.entries.contains_key(player_id)
    }

    /// Stores `min_dkp` unless the player already has a baseline. Returns
    /// whether the map changed.
    pub fn insert_if_absent(&mut self, player_id: &str, min_dkp: i64) -> bool {
        if self.entries.contains_key(player_id) {
            return false;
        }
        self.entries.insert(player_id.to_string(), min_dkp);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), *value))
    }
}

impl From<BTreeMap<String, f64>> for MinDkpMap {
    fn from(raw: BTreeMap<String, f64>) -> Self {
        let entries = raw
            .into_iter()
            .map(|(id, value)| (id.trim().to_string(), round_half_up(value)))
            .filter(|(id, _)| !id.is_empty())
            .collect();
        Self { entries }
    }
}

impl From<MinDkpMap> for BTreeMap<String, i64> {
    fn from(map: MinDkpMap) -> Self {
        map.entries
    }
}

impl FromIterator<(String, i64)> for MinDkpMap {
    fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Player IDs exempted from expectation; recorded on result rows only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacationList {
    ids: Vec<String>,
}

impl VacationList {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for id in ids {
            let id = id.as_ref().trim();
            if !id.is_empty() && !list.contains(id) {
                list.ids.push(id.to_string());
            }
        }
        list
    }

    /// Parses the comma-separated form used by the settings form.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.ids.iter().any(|id| id == player_id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn to_display(&self) -> String {
        self.ids.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baselines_are_written_once() {
        let mut map = MinDkpMap::default();
        assert!(map.insert_if_absent("42", 1000));
        assert!(!map.insert_if_absent("42", 5000));
        assert_eq!(map.get("42"), Some(1000));

        map.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn imported_baselines_are_rounded() {
        let map: MinDkpMap =
            serde_json::from_str(r#"{"1": 1200, "2": 99.5, " ": 3}"#).expect("parse map");
        assert_eq!(map.get("1"), Some(1200));
        assert_eq!(map.get("2"), Some(100));
        assert_eq!(map.len(), 2);

        let json = serde_json::to_string(&map).expect("serialize map");
        assert_eq!(json, r#"{"1":1200,"2":100}"#);
    }

    #[test]
    fn vacation_list_parses_comma_separated_ids() {
        let list = VacationList::parse(" 101, 202,,303 ,101 ");
        assert_eq!(list.ids(), ["101", "202", "303"]);
        assert!(list.contains("202"));
        assert!(!list.contains("404"));
        assert_eq!(list.to_display(), "101, 202, 303");
        assert!(VacationList::parse("   ").is_empty());
    }
}
