//! Normalized header lookup over the environment.
//!
//! CGI hosts expose most headers as `HTTP_ACCEPT_ENCODING`, a few without the
//! prefix (`CONTENT_TYPE`), and proxies add bare `X_*` keys. The index folds
//! all of them onto one canonical spelling so `accept-encoding`,
//! `HTTP_ACCEPT_ENCODING` and `Accept_Encoding` find the same value.

use std::collections::HashMap;

use crate::environment::Environment;

/// Non-prefixed CGI keys that carry header values.
const UNPREFIXED: &[&str] = &[
    "CONTENT_TYPE",
    "CONTENT_LENGTH",
    "CONTENT_MD5",
    "AUTH_TYPE",
    "REMOTE_USER",
];

const PREFIX: &str = "HTTP_";

/// Header values keyed by canonical name: upper-case, `_`-separated, with a
/// leading `HTTP_` removed once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    map: HashMap<String, String>,
}

impl HeaderIndex {
    pub fn from_env(env: &Environment) -> Self {
        let mut map = HashMap::new();
        let mut unprefixed = Vec::new();

        for (key, value) in env.iter() {
            if key.starts_with(PREFIX) {
                map.insert(canonical(key), value.to_owned());
            } else if key.starts_with("X_") || UNPREFIXED.contains(&key) {
                unprefixed.push((key, value));
            }
        }
        // The CGI spelling wins when a host sends both, e.g. `CONTENT_TYPE`
        // next to a duplicated `HTTP_CONTENT_TYPE`.
        for (key, value) in unprefixed {
            map.insert(canonical(key), value.to_owned());
        }

        Self { map }
    }

    /// Case-, dash- and prefix-insensitive lookup. `None` when the header was
    /// not sent; `Some("")` when it was sent empty.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(&canonical(name)).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool { self.map.contains_key(&canonical(name)) }
    pub fn len(&self) -> usize { self.map.len() }
    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    /// Iterates `(canonical name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// `http-accept-encoding` → `ACCEPT_ENCODING`; `X_HTTP_METHOD_OVERRIDE` is
/// left alone because its `HTTP_` is not a prefix.
fn canonical(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase().replace('-', "_");
    match upper.strip_prefix(PREFIX) {
        Some(rest) if !rest.is_empty() => rest.to_owned(),
        _ => upper,
    }
}
