//! Route parameter extraction and query string parsing.
//!
//! This module provides two complementary types for working with URL data:
//!
//! - [`RouteParams`] — path parameters extracted from dynamic segments (e.g.
//!   `:projectId` in `/projects/:projectId`). Supports typed access via
//!   [`get_as`](RouteParams::get_as) and parent-child merging via
//!   [`merge`](RouteParams::merge).
//! - [`QueryParams`] — query string parameters parsed from the `?key=value&...`
//!   portion of a URL. Supports multi-valued keys, typed access, and
//!   round-trip serialization. The login redirect uses this to carry the
//!   originally requested path as a percent-encoded `next` parameter.
//!
//! # Example
//!
//! ```
//! use fieldwork_navigator::{RouteParams, QueryParams};
//!
//! // Path parameters from /projects/42
//! let mut params = RouteParams::new();
//! params.set("projectId".to_string(), "42".to_string());
//! assert_eq!(params.get_as::<u32>("projectId"), Some(42));
//!
//! // Query parameters from ?next=%2Fprojects%2F42
//! let query = QueryParams::from_query_string("next=%2Fprojects%2F42");
//! assert_eq!(query.get("next"), Some(&"/projects/42".to_string()));
//! ```

use std::collections::HashMap;

/// Route parameters extracted from path segments
///
/// # Example
///
/// ```
/// use fieldwork_navigator::RouteParams;
///
/// // Route pattern: /projects/:projectId
/// // Matched path: /projects/123
/// let mut params = RouteParams::new();
/// params.insert("projectId".to_string(), "123".to_string());
///
/// assert_eq!(params.get("projectId"), Some(&"123".to_string()));
/// assert_eq!(params.get_as::<i32>("projectId"), Some(123));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteParams {
    params: HashMap<String, String>,
}

impl RouteParams {
    /// Create empty route parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from an existing `HashMap`.
    pub fn from_map(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Get a parameter value by key.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }

    /// Get a parameter and parse it as a specific type
    ///
    /// Returns `None` if the parameter doesn't exist or cannot be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.params.get(key)?.parse().ok()
    }

    /// Insert or overwrite a parameter.
    pub fn insert(&mut self, key: String, value: String) {
        self.params.insert(key, value);
    }

    /// Set a parameter (alias for [`insert`](Self::insert)).
    pub fn set(&mut self, key: String, value: String) {
        self.params.insert(key, value);
    }

    /// Return `true` if the given key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Get a reference to the underlying parameter map.
    pub fn all(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Iterate over all `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.params.iter()
    }

    /// Return `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Return the number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Merge parent parameters with child parameters
    ///
    /// Child parameters override parent parameters in case of collision.
    /// This is used for nested routing to inherit parent route parameters.
    ///
    /// # Example
    ///
    /// ```
    /// use fieldwork_navigator::RouteParams;
    ///
    /// let mut parent = RouteParams::new();
    /// parent.set("projectId".to_string(), "1".to_string());
    ///
    /// let mut child = RouteParams::new();
    /// child.set("xmlFormId".to_string(), "f".to_string());
    ///
    /// let merged = RouteParams::merge(&parent, &child);
    /// assert_eq!(merged.get("projectId"), Some(&"1".to_string()));
    /// assert_eq!(merged.get("xmlFormId"), Some(&"f".to_string()));
    /// ```
    pub fn merge(parent: &RouteParams, child: &RouteParams) -> RouteParams {
        let mut merged = parent.clone();

        // Child params override parent params
        for (key, value) in child.iter() {
            merged.insert(key.clone(), value.clone());
        }

        merged
    }
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters parsed from a URL query string
///
/// Supports multiple values for the same key.
///
/// # Example
///
/// ```
/// use fieldwork_navigator::QueryParams;
///
/// let query = QueryParams::from_query_string("next=%2Fusers&tab=a&tab=b");
///
/// assert_eq!(query.get("next"), Some(&"/users".to_string()));
/// assert_eq!(query.get_all("tab").unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    params: HashMap<String, Vec<String>>,
}

impl QueryParams {
    /// Create empty query parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from query string
    ///
    /// # Example
    ///
    /// ```
    /// use fieldwork_navigator::QueryParams;
    ///
    /// let query = QueryParams::from_query_string("page=1&sort=name");
    /// assert_eq!(query.get("page"), Some(&"1".to_string()));
    /// ```
    pub fn from_query_string(query: &str) -> Self {
        let mut params = HashMap::new();

        for pair in query.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                let key = decode_uri_component(key);
                let value = decode_uri_component(value);

                params.entry(key).or_insert_with(Vec::new).push(value);
            }
        }

        Self { params }
    }

    /// Get the first value for a key.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.params.get(key)?.first()
    }

    /// Get all values for a key.
    pub fn get_all(&self, key: &str) -> Option<&Vec<String>> {
        self.params.get(key)
    }

    /// Get the first value for a key, parsed as type `T`.
    ///
    /// Returns `None` if the key is missing or the value cannot be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(key)?.parse().ok()
    }

    /// Append a value for the given key.
    ///
    /// If the key already exists, the new value is added to the list (not replaced).
    pub fn insert(&mut self, key: String, value: String) {
        self.params.entry(key).or_default().push(value);
    }

    /// Return `true` if the given key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Serialize back into a query string.
    ///
    /// # Example
    ///
    /// ```
    /// use fieldwork_navigator::QueryParams;
    ///
    /// let mut query = QueryParams::new();
    /// query.insert("next".to_string(), "/projects/1".to_string());
    /// assert_eq!(query.to_query_string(), "next=%2Fprojects%2F1");
    /// ```
    pub fn to_query_string(&self) -> String {
        let pairs: Vec<String> = self
            .params
            .iter()
            .flat_map(|(key, values)| {
                values.iter().map(move |value| {
                    format!(
                        "{}={}",
                        encode_uri_component(key),
                        encode_uri_component(value)
                    )
                })
            })
            .collect();

        pairs.join("&")
    }

    /// Return `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Return the number of unique parameter keys.
    pub fn len(&self) -> usize {
        self.params.len()
    }
}

/// Split a full path into its path and query portions.
///
/// ```
/// use fieldwork_navigator::params::split_path_query;
///
/// assert_eq!(split_path_query("/login?next=%2F"), ("/login", Some("next=%2F")));
/// assert_eq!(split_path_query("/users"), ("/users", None));
/// ```
pub fn split_path_query(full: &str) -> (&str, Option<&str>) {
    match full.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (full, None),
    }
}

/// URI component encoding over UTF-8 bytes
fn encode_uri_component(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => result.push_str(&format!("%{:02X}", byte)),
        }
    }
    result
}

/// URI component decoding; invalid escapes pass through unchanged
fn decode_uri_component(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut iter = s.bytes();

    while let Some(b) = iter.next() {
        if b == b'%' {
            let hex: String = iter.by_ref().take(2).map(|b| b as char).collect();
            match u8::from_str_radix(&hex, 16) {
                Ok(byte) if hex.len() == 2 => bytes.push(byte),
                _ => {
                    bytes.push(b'%');
                    bytes.extend(hex.bytes());
                }
            }
        } else if b == b'+' {
            bytes.push(b' ');
        } else {
            bytes.push(b);
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

// Query parameters tests

#[test]
fn test_query_params_basic() {
    let query = QueryParams::from_query_string("page=1&sort=name&filter=active");

    assert_eq!(query.get("page"), Some(&"1".to_string()));
    assert_eq!(query.get("sort"), Some(&"name".to_string()));
    assert_eq!(query.get("filter"), Some(&"active".to_string()));
    assert_eq!(query.get("missing"), None);
}

#[test]
fn test_query_params_get_as() {
    let query = QueryParams::from_query_string("page=1&limit=50&active=true");

    assert_eq!(query.get_as::<i32>("page"), Some(1));
    assert_eq!(query.get_as::<usize>("limit"), Some(50));
    assert_eq!(query.get_as::<bool>("active"), Some(true));
    assert_eq!(query.get_as::<i32>("missing"), None);
}

#[test]
fn test_query_params_multiple_values() {
    let query = QueryParams::from_query_string("tag=a&tag=b&tag=c");

    let tags = query.get_all("tag").unwrap();
    assert_eq!(tags.len(), 3);

    // get() returns first value
    assert_eq!(query.get("tag"), Some(&"a".to_string()));
}

#[test]
fn test_query_params_insert_appends() {
    let mut query = QueryParams::new();
    query.insert("key".to_string(), "value1".to_string());
    query.insert("key".to_string(), "value2".to_string());

    let values = query.get_all("key").unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0], "value1");
    assert_eq!(values[1], "value2");
}

#[test]
fn test_uri_encoding() {
    let encoded = encode_uri_component("hello world");
    assert_eq!(encoded, "hello%20world");

    let encoded = encode_uri_component("/projects/1?tab=x");
    assert_eq!(encoded, "%2Fprojects%2F1%3Ftab%3Dx");
}

#[test]
fn test_uri_decoding() {
    let decoded = decode_uri_component("hello%20world");
    assert_eq!(decoded, "hello world");

    let decoded = decode_uri_component("hello+world");
    assert_eq!(decoded, "hello world");

    let decoded = decode_uri_component("%2Fprojects%2F1");
    assert_eq!(decoded, "/projects/1");
}

#[test]
fn test_uri_round_trip_multibyte() {
    let original = "résumé ↑";
    assert_eq!(decode_uri_component(&encode_uri_component(original)), original);
}

#[test]
fn test_next_param_round_trip() {
    let mut query = QueryParams::new();
    query.insert("next".to_string(), "/projects/1/forms/f?tab=draft".to_string());

    let serialized = query.to_query_string();
    let parsed = QueryParams::from_query_string(&serialized);
    assert_eq!(
        parsed.get("next"),
        Some(&"/projects/1/forms/f?tab=draft".to_string())
    );
}

#[test]
fn test_split_path_query() {
    assert_eq!(split_path_query("/users?next=%2F"), ("/users", Some("next=%2F")));
    assert_eq!(split_path_query("/users"), ("/users", None));
    assert_eq!(split_path_query("/?a=1"), ("/", Some("a=1")));
}

#[test]
fn test_empty_query_string() {
    let query = QueryParams::from_query_string("");
    assert!(query.is_empty());
}
