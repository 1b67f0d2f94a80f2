use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Prefix for headers that set (or overwrite) an account metadata key.
pub const ACCOUNT_METADATA_PREFIX: &str = "X-Account-Meta-";
/// Prefix for headers that remove an account metadata key.
pub const ACCOUNT_REMOVE_METADATA_PREFIX: &str = "X-Remove-Account-Meta-";
/// Secret used to sign temporary URLs. Shares the metadata prefix on the wire.
pub const ACCOUNT_TEMPORARY_URL_KEY: &str = "X-Account-Meta-Temp-URL-Key";
pub const ACCOUNT_CONTAINER_COUNT: &str = "X-Account-Container-Count";
pub const ACCOUNT_OBJECT_COUNT: &str = "X-Account-Object-Count";
pub const ACCOUNT_BYTES_USED: &str = "X-Account-Bytes-Used";
pub const AUTH_TOKEN: &str = "X-Auth-Token";

/// Header name to value mapping with case-insensitive names.
///
/// Each name holds a single value; inserting a name that already exists
/// (in any casing) replaces both the value and the stored casing. Iteration
/// is ordered by lowercased name, so equal sets always iterate identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: BTreeMap<String, (String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries
            .insert(name.to_ascii_lowercase(), (name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, value)` pairs, names in their stored casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Iterate headers whose name starts with `prefix` (ignoring ASCII case),
    /// yielding the remainder of the name and the value.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.iter().filter_map(move |(name, value)| {
            strip_prefix_ignore_case(name, prefix).map(|rest| (rest, value))
        })
    }

    /// Merge `other` into `self`; entries in `other` win on conflict.
    #[must_use]
    pub fn merged(mut self, other: HeaderSet) -> Self {
        self.entries.extend(other.entries);
        self
    }
}

/// `name` without `prefix`, comparing the prefix ignoring ASCII case.
pub fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&name[prefix.len()..])
    } else {
        None
    }
}

/// `x-account-meta-color` -> `X-Account-Meta-Color`, the form the service emits.
pub fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    let mut word = String::with_capacity(part.len());
                    word.push(first.to_ascii_uppercase());
                    word.push_str(&chars.as_str().to_ascii_lowercase());
                    word
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        set.extend(iter);
        set
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for HeaderSet {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl Serialize for HeaderSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let mut set = HeaderSet::new();
        set.insert("X-Account-Object-Count", "7");
        assert_eq!(set.get("x-account-object-count"), Some("7"));
        assert_eq!(set.get("X-ACCOUNT-OBJECT-COUNT"), Some("7"));
        assert!(set.contains("x-Account-object-COUNT"));
    }

    #[test]
    fn last_write_wins_across_casings() {
        let mut set = HeaderSet::new();
        set.insert("X-Account-Meta-Color", "red");
        set.insert("x-account-meta-color", "blue");
        assert_eq!(set.len(), 1);
        let (name, value) = set.iter().next().unwrap();
        assert_eq!(name, "x-account-meta-color");
        assert_eq!(value, "blue");
    }

    #[test]
    fn with_prefix_strips_and_preserves_suffix_case() {
        let set: HeaderSet = [
            ("X-Account-Meta-Color", "red"),
            ("x-account-meta-Shape", "round"),
            ("X-Account-Bytes-Used", "10"),
        ]
        .into_iter()
        .collect();

        let mut found: Vec<_> = set.with_prefix(ACCOUNT_METADATA_PREFIX).collect();
        found.sort_unstable();
        assert_eq!(found, vec![("Color", "red"), ("Shape", "round")]);
    }

    #[test]
    fn with_prefix_skips_short_and_multibyte_names() {
        let set: HeaderSet = [("X-Acc", "1"), ("Ünicode-Header-Name", "2")]
            .into_iter()
            .collect();
        assert_eq!(set.with_prefix(ACCOUNT_METADATA_PREFIX).count(), 0);
    }

    #[test]
    fn merged_prefers_other() {
        let base: HeaderSet = [("X-Auth-Token", "t1"), ("A", "1")].into_iter().collect();
        let extra: HeaderSet = [("a", "2")].into_iter().collect();
        let merged = base.merged(extra);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("A"), Some("2"));
        assert_eq!(merged.get("x-auth-token"), Some("t1"));
    }

    #[test]
    fn canonical_names() {
        assert_eq!(
            canonical_name("x-account-meta-color"),
            "X-Account-Meta-Color"
        );
        assert_eq!(canonical_name("content-length"), "Content-Length");
        assert_eq!(canonical_name("X-TIMESTAMP"), "X-Timestamp");
        assert_eq!(canonical_name("x--double"), "X--Double");
    }

    #[test]
    fn serializes_as_json_object() {
        let set: HeaderSet = [("B", "2"), ("a", "1")].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"a":"1","B":"2"}"#);
    }
}
