//! Scheme, host, port and path reconstruction.
//!
//! # Script name and path info
//!
//! A CGI deployment splits the request path in two: the *script name* is the
//! physical prefix that reached the application, the *path info* is the
//! virtual remainder the application routes on.
//!
//! | Deployment | `SCRIPT_NAME` | `PATH_INFO` | `path()` |
//! |---|---|---|---|
//! | subdirectory, no rewrite | `/foo/index.php` | `/bar/xyz` | `/foo/index.php/bar/xyz` |
//! | subdirectory, rewrite | `/foo` | `/bar/xyz` | `/foo/bar/xyz` |
//! | root, rewrite | `` | `/bar/xyz` | `/bar/xyz` |
//!
//! `path()` is always the plain concatenation. Routing depends on that.

use crate::environment::{Environment, keys};
use crate::headers::HeaderIndex;

/// Where the request was addressed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    scheme: String,
    host: String,
    port: u16,
    script_name: String,
    path_info: String,
}

impl Location {
    pub fn from_env(env: &Environment, headers: &HeaderIndex) -> Self {
        let scheme = env.get(keys::URL_SCHEME)
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "http".to_owned());

        let host = match headers.get("Host") {
            Some(raw) => strip_port(raw.trim()).to_owned(),
            None => env.get(keys::SERVER_NAME).unwrap_or("").to_owned(),
        };

        let port = env.get(keys::SERVER_PORT)
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or_else(|| default_port(&scheme).unwrap_or(80));

        let declared_script = env.get(keys::SCRIPT_NAME).unwrap_or("");
        let (script_name, path_info) = match (env.get(keys::PATH_INFO), env.get(keys::REQUEST_URI)) {
            (Some(path_info), _) => (declared_script.to_owned(), path_info.to_owned()),
            (None, Some(uri)) => split_request_uri(uri, declared_script),
            (None, None) => (declared_script.to_owned(), String::new()),
        };

        Self { scheme, host, port, script_name, path_info }
    }

    /// `http` or `https`, as reported by the host. Never inferred from
    /// headers.
    pub fn scheme(&self) -> &str { &self.scheme }

    /// The `Host` header without its port, or `SERVER_NAME`.
    pub fn host(&self) -> &str { &self.host }

    pub fn port(&self) -> u16 { self.port }

    pub fn host_with_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn script_name(&self) -> &str { &self.script_name }
    pub fn root_uri(&self) -> &str { &self.script_name }
    pub fn path_info(&self) -> &str { &self.path_info }
    pub fn resource_uri(&self) -> &str { &self.path_info }

    pub fn path(&self) -> String {
        format!("{}{}", self.script_name, self.path_info)
    }

    /// `scheme://host[:port]`; the port is omitted when it is the scheme's
    /// default.
    pub fn url(&self) -> String {
        if default_port(&self.scheme) == Some(self.port) {
            format!("{}://{}", self.scheme, self.host)
        } else {
            format!("{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// `[2001:db8::1]:80` → `[2001:db8::1]`, `example.com:80` → `example.com`.
/// An unbracketed host with several colons is a bare IPv6 literal and is
/// returned as is.
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        if let Some(end) = host.find(']') {
            let rest = &host[end + 1..];
            if rest.is_empty() || is_port_suffix(rest) {
                return &host[..=end];
            }
        }
        return host;
    }
    match host.find(':') {
        Some(colon) if is_port_suffix(&host[colon..]) => &host[..colon],
        _ => host,
    }
}

fn is_port_suffix(s: &str) -> bool {
    s.strip_prefix(':')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Derives script name and path info from `REQUEST_URI` for hosts that do
/// not set `PATH_INFO`.
///
/// When the URI does not start with the script name, a rewrite module hid
/// the script file and its directory is the physical prefix instead.
fn split_request_uri(uri: &str, script_name: &str) -> (String, String) {
    let path = uri.split_once('?').map_or(uri, |(path, _)| path);

    let physical = if path.starts_with(script_name) {
        script_name
    } else {
        script_name.rsplit_once('/').map_or("", |(dir, _)| dir)
    };
    let physical = if path.starts_with(physical) { physical } else { "" };

    let virtual_path = &path[physical.len()..];
    let path_info = if virtual_path.starts_with('/') {
        virtual_path.to_owned()
    } else {
        format!("/{virtual_path}")
    };

    (physical.trim_end_matches('/').to_owned(), path_info)
}
