use smol_str::SmolStr;

/// Ordered per-record tag store (the SD data items of a record).
///
/// Keys keep their first insertion position; overwriting a key replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagStore {
    entries: Vec<(SmolStr, String)>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|idx| self.entries[idx].1.as_str())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.position(key) {
            Some(idx) => self.entries[idx].1 = value,
            None => self.entries.push((SmolStr::new(key), value)),
        }
    }

    /// Removes `key`, returning its value. Missing keys are ignored.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.position(key)
            .map(|idx| self.entries.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_appends_new_keys_and_replaces_in_place() {
        let mut tags = TagStore::new();
        tags.set("b", "1");
        tags.set("a", "2");
        tags.set("b", "3");

        assert_eq!(tags.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(tags.get("b"), Some("3"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn remove_returns_value_and_ignores_missing_keys() {
        let mut tags = TagStore::new();
        tags.set("x", "value");

        assert_eq!(tags.remove("x"), Some("value".to_string()));
        assert_eq!(tags.remove("x"), None);
        assert!(tags.is_empty());
        assert!(!tags.contains("x"));
    }
}
