//! CGI-style environment map.
//!
//! The host server owns the socket. It describes each inbound request as a
//! flat map of string variables (`REQUEST_METHOD`, `QUERY_STRING`, `HTTP_*`
//! headers, ...) and hands that map over. Nothing here reads process-wide
//! state: the map is the whole input.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;

/// Well-known environment keys.
pub mod keys {
    pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
    pub const REQUEST_URI: &str = "REQUEST_URI";
    pub const SCRIPT_NAME: &str = "SCRIPT_NAME";
    pub const PATH_INFO: &str = "PATH_INFO";
    pub const QUERY_STRING: &str = "QUERY_STRING";
    pub const SERVER_NAME: &str = "SERVER_NAME";
    pub const SERVER_PORT: &str = "SERVER_PORT";
    pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
    pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
    pub const REMOTE_PORT: &str = "REMOTE_PORT";
    pub const CONTENT_TYPE: &str = "CONTENT_TYPE";
    pub const CONTENT_LENGTH: &str = "CONTENT_LENGTH";

    /// Raw request body, already read by the host. Empty, not absent, when
    /// the request has no body or the host consumed a multipart body.
    pub const INPUT: &str = "slim.input";
    /// `http` or `https`, as terminated by the host.
    pub const URL_SCHEME: &str = "slim.url_scheme";
    /// Set by a host that already applied a method override upstream.
    pub const ORIGINAL_METHOD: &str = "slim.method_override.original_method";
}

/// An owned, string-keyed view of one inbound transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plausible `GET /` environment, as a local development server would
    /// produce it. Override individual keys with [`with`](Self::with).
    pub fn mock() -> Self {
        Self::new()
            .with(keys::REQUEST_METHOD, "GET")
            .with(keys::SCRIPT_NAME, "")
            .with(keys::PATH_INFO, "")
            .with(keys::QUERY_STRING, "")
            .with(keys::SERVER_NAME, "localhost")
            .with(keys::SERVER_PORT, "80")
            .with("HTTP_ACCEPT", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .with("HTTP_ACCEPT_LANGUAGE", "en-US,en;q=0.8")
            .with("HTTP_ACCEPT_CHARSET", "ISO-8859-1,utf-8;q=0.7,*;q=0.3")
            .with("HTTP_USER_AGENT", "envreq")
            .with(keys::REMOTE_ADDR, "127.0.0.1")
            .with(keys::URL_SCHEME, "http")
            .with(keys::INPUT, "")
    }

    /// Sets `key` and returns `self` for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// Exact-key lookup. Header normalization lives in
    /// [`HeaderIndex`](crate::HeaderIndex), not here.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool { self.vars.contains_key(key) }
    pub fn len(&self) -> usize { self.vars.len() }
    pub fn is_empty(&self) -> bool { self.vars.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Builds the CGI layout from a request head that an `http`-based server
    /// (hyper, axum, ...) already parsed, plus the fully read body.
    ///
    /// Headers become `HTTP_<NAME>` except `Content-Type` and `Content-Length`,
    /// which keep their CGI names. The whole path is exposed as `PATH_INFO`
    /// with an empty `SCRIPT_NAME`.
    pub fn from_http(parts: &http::request::Parts, body: &Bytes, peer: Option<SocketAddr>) -> Self {
        let mut env = Self::new();

        let scheme = parts.uri.scheme_str().unwrap_or("http").to_ascii_lowercase();
        let host_header = parts.headers.get(http::header::HOST).and_then(|v| v.to_str().ok());
        let authority = parts.uri.authority().map(|a| a.as_str()).or(host_header);

        let (server_name, server_port) = match authority.map(split_authority) {
            Some((name, port)) => (name.to_owned(), port),
            None => ("localhost".to_owned(), None),
        };
        let server_port = server_port.unwrap_or(if scheme == "https" { 443 } else { 80 });

        env.insert(keys::REQUEST_METHOD, parts.method.as_str());
        env.insert(
            keys::REQUEST_URI,
            parts.uri.path_and_query().map_or("/", |pq| pq.as_str()),
        );
        env.insert(keys::SCRIPT_NAME, "");
        env.insert(keys::PATH_INFO, parts.uri.path());
        env.insert(keys::QUERY_STRING, parts.uri.query().unwrap_or(""));
        env.insert(keys::SERVER_NAME, server_name);
        env.insert(keys::SERVER_PORT, server_port.to_string());
        env.insert(keys::SERVER_PROTOCOL, format!("{:?}", parts.version));
        env.insert(keys::URL_SCHEME, scheme);
        env.insert(keys::INPUT, String::from_utf8_lossy(body));

        if let Some(peer) = peer {
            env.insert(keys::REMOTE_ADDR, peer.ip().to_string());
            env.insert(keys::REMOTE_PORT, peer.port().to_string());
        }

        for name in parts.headers.keys() {
            let values: Vec<&str> = parts.headers.get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            if values.is_empty() {
                continue;
            }
            let separator = if *name == http::header::COOKIE { "; " } else { ", " };
            let cgi_name = name.as_str().to_ascii_uppercase().replace('-', "_");
            let key = match cgi_name.as_str() {
                keys::CONTENT_TYPE | keys::CONTENT_LENGTH => cgi_name,
                _ => format!("HTTP_{cgi_name}"),
            };
            env.insert(key, values.join(separator));
        }

        env
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Environment {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Splits `host[:port]`, keeping IPv6 brackets on the host.
fn split_authority(authority: &str) -> (&str, Option<u16>) {
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    if authority.starts_with('[') {
        return match authority.find(']') {
            Some(end) => {
                let port = authority[end + 1..].strip_prefix(':').and_then(|p| p.parse().ok());
                (&authority[..=end], port)
            }
            None => (authority, None),
        };
    }
    match authority.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => (host, port.parse().ok()),
        _ => (authority, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_has_the_host_minimum() {
        let env = Environment::mock();
        assert_eq!(env.get(keys::REQUEST_METHOD), Some("GET"));
        assert_eq!(env.get(keys::INPUT), Some(""));
        assert_eq!(env.get(keys::SERVER_PORT), Some("80"));
        assert_eq!(env.get("NOPE"), None);
    }

    #[test]
    fn with_overrides_defaults() {
        let env = Environment::mock().with(keys::REQUEST_METHOD, "POST");
        assert_eq!(env.get(keys::REQUEST_METHOD), Some("POST"));
    }

    #[test]
    fn splits_authorities() {
        assert_eq!(split_authority("example.com:8080"), ("example.com", Some(8080)));
        assert_eq!(split_authority("example.com"), ("example.com", None));
        assert_eq!(split_authority("[::1]:3000"), ("[::1]", Some(3000)));
        assert_eq!(split_authority("[::1]"), ("[::1]", None));
        assert_eq!(split_authority("user@host:21"), ("host", Some(21)));
    }

    #[test]
    fn adapts_an_http_request_head() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/users/42?expand=1")
            .header("host", "api.example.com:8443")
            .header("content-type", "application/x-www-form-urlencoded")
            .header("x-forwarded-for", "10.0.0.9")
            .header("cookie", "a=1")
            .header("cookie", "b=2")
            .body(())
            .unwrap();
        let (parts, ()) = req.into_parts();
        let peer: SocketAddr = "192.0.2.7:51000".parse().unwrap();

        let env = Environment::from_http(&parts, &Bytes::from_static(b"name=alice"), Some(peer));

        assert_eq!(env.get(keys::REQUEST_METHOD), Some("POST"));
        assert_eq!(env.get(keys::PATH_INFO), Some("/users/42"));
        assert_eq!(env.get(keys::QUERY_STRING), Some("expand=1"));
        assert_eq!(env.get(keys::REQUEST_URI), Some("/users/42?expand=1"));
        assert_eq!(env.get(keys::SERVER_NAME), Some("api.example.com"));
        assert_eq!(env.get(keys::SERVER_PORT), Some("8443"));
        assert_eq!(env.get(keys::CONTENT_TYPE), Some("application/x-www-form-urlencoded"));
        assert_eq!(env.get("HTTP_HOST"), Some("api.example.com:8443"));
        assert_eq!(env.get("HTTP_X_FORWARDED_FOR"), Some("10.0.0.9"));
        assert_eq!(env.get("HTTP_COOKIE"), Some("a=1; b=2"));
        assert_eq!(env.get(keys::INPUT), Some("name=alice"));
        assert_eq!(env.get(keys::REMOTE_ADDR), Some("192.0.2.7"));
        assert_eq!(env.get(keys::URL_SCHEME), Some("http"));
    }
}
