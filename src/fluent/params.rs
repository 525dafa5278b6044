//! Ordered route parameter bag.

use serde::{Serialize, Serializer, ser::SerializeMap};

/// Named parameters captured from a path, in template order.
///
/// Middleware stages receive a `Params` and hand back a replacement, so the
/// type is a plain value: cloning is cheap for the handful of entries a
/// route carries, and there is no shared mutable state between stages.
///
/// ```
/// use kiwi_dispatch::Params;
///
/// let params = Params::new().with("id", "42").with("user", "ada");
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.keys().collect::<Vec<_>>(), ["id", "user"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets `name` to `value`. An existing key keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name, value)),
        }
    }

    /// Consuming variant of [`Params::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Overlays `other` on top of `self`: new keys are appended, existing keys overwritten.
    #[must_use]
    pub fn merge(mut self, other: Params) -> Self {
        for (name, value) in other.0 {
            self.insert(name, value);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut params = Params::new().with("a", "1").with("b", "2");
        params.insert("a", "3");
        assert_eq!(params.iter().collect::<Vec<_>>(), [("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_merge_appends_and_overwrites() {
        let base = Params::new().with("id", "42");
        let merged = base.merge(Params::new().with("user", "ada").with("id", "7"));
        assert_eq!(merged.iter().collect::<Vec<_>>(), [("id", "7"), ("user", "ada")]);
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let params: Params = [("z", "1"), ("a", "2")].into_iter().collect();
        assert_eq!(serde_json::to_string(&params).unwrap(), r#"{"z":"1","a":"2"}"#);
    }
}
