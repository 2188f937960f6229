//! Insertion-ordered string multimap used for headers and query strings.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered map from key to an ordered list of values.
///
/// Keys keep the order in which they were first seen. Repeated keys append
/// to the existing value list instead of creating a new entry. Serializes as
/// a JSON object of string arrays, e.g. `{"Accept": ["a", "b"]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultiMap {
    entries: Vec<(String, Vec<String>)>,
}

impl MultiMap {
    /// Create an empty multimap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` under `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some((_, values)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            values.push(value);
        } else {
            self.entries.push((key, vec![value]));
        }
    }

    /// All values stored under `key`, in arrival order.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// First value stored under `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// Iterate `(key, values)` in key insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no keys are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for MultiMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.append(k, v);
        }
        map
    }
}

impl Serialize for MultiMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Render an HTTP header name in canonical MIME form.
///
/// The first letter and any letter following a hyphen are upper-cased, the
/// rest lower-cased: `content-type` becomes `Content-Type`. Names holding a
/// space or other byte that is not a token character are returned unchanged.
pub fn canonical_header_key(name: &str) -> String {
    let is_token = |b: u8| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b);
    if name.is_empty() || !name.bytes().all(is_token) {
        return name.to_owned();
    }

    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn repeated_keys_group_in_arrival_order() {
        let mut m = MultiMap::new();
        m.append("tag", "a");
        m.append("other", "x");
        m.append("tag", "b");

        assert_eq!(m.len(), 2);
        assert_eq!(m.get("tag").unwrap(), ["a", "b"]);
        assert_eq!(m.first("other"), Some("x"));
        assert!(m.get("missing").is_none());
    }

    #[test]
    fn serializes_as_object_of_arrays_in_key_order() {
        let m: MultiMap = [("b", "1"), ("a", "2"), ("b", "3")].into_iter().collect();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"b":["1","3"],"a":["2"]}"#);
    }

    #[test]
    fn empty_map_serializes_as_empty_object() {
        let m = MultiMap::new();
        assert!(m.is_empty());
        assert_eq!(serde_json::to_string(&m).unwrap(), "{}");
    }

    #[test]
    fn canonical_keys() {
        assert_eq!(canonical_header_key("content-type"), "Content-Type");
        assert_eq!(canonical_header_key("x-request-id"), "X-Request-Id");
        assert_eq!(canonical_header_key("ACCEPT"), "Accept");
        assert_eq!(canonical_header_key("host"), "Host");
    }

    #[test]
    fn canonical_key_leaves_invalid_names_alone() {
        assert_eq!(canonical_header_key("bad header"), "bad header");
        assert_eq!(canonical_header_key(""), "");
    }

    proptest! {
        #[test]
        fn values_preserve_order_per_key(values in proptest::collection::vec("[a-z]{1,4}", 0..20)) {
            let mut m = MultiMap::new();
            for v in &values {
                m.append("k", v.clone());
            }
            let got = m.get("k").map(<[String]>::to_vec).unwrap_or_default();
            prop_assert_eq!(got, values);
        }
    }
}
