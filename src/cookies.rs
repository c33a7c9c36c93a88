//! Request cookies and the response cookie jar.
//!
//! Inbound cookies are parsed from the `Cookie` header. Outbound cookies are
//! collected in a [`CookieJar`]; serializing them into `Set-Cookie` lines
//! belongs to the response layer.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

const ONE_DAY: Duration = Duration::from_secs(86_400);

/// One outbound cookie.
///
/// Built from a plain string, every attribute is absent or `false`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cookie {
    pub value: String,
    pub expires: Option<SystemTime>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
}

impl From<&str> for Cookie {
    fn from(value: &str) -> Self {
        Self { value: value.to_owned(), ..Self::default() }
    }
}

impl From<String> for Cookie {
    fn from(value: String) -> Self {
        Self { value, ..Self::default() }
    }
}

/// Cookies to be sent with the response, keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieJar {
    data: HashMap<String, Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a cookie, replacing any previous one with the same name.
    pub fn set(&mut self, name: impl Into<String>, cookie: impl Into<Cookie>) {
        self.data.insert(name.into(), cookie.into());
    }

    /// Expires a cookie on the client: an empty value with an expiry one day
    /// in the past.
    pub fn remove(&mut self, name: impl Into<String>) {
        let expires = SystemTime::now()
            .checked_sub(ONE_DAY)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        self.set(name, Cookie { value: String::new(), expires: Some(expires), ..Cookie::default() });
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> { self.data.get(name) }
    pub fn len(&self) -> usize { self.data.len() }
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cookie)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A copy of the jar's contents.
    pub fn snapshot(&self) -> HashMap<String, Cookie> {
        self.data.clone()
    }
}

/// Parses a `Cookie` request header. Pairs are separated by `;` or `,`,
/// values are percent-decoded, and the first occurrence of a name wins.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for pair in header.split([';', ',']) {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = value.trim();
        let value = urlencoding::decode(value).map_or_else(|_| value.to_owned(), |v| v.into_owned());
        cookies.entry(name.to_owned()).or_insert(value);
    }
    cookies
}
