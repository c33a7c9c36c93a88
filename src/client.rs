//! Client address resolution.

use crate::environment::{Environment, keys};

/// Sources consulted, most trusted first. Proxies that set a bare
/// `X_FORWARDED_FOR` win over the header-shaped variant.
const SOURCES: &[&str] = &[
    "X_FORWARDED_FOR",
    "HTTP_X_FORWARDED_FOR",
    "CLIENT_IP",
    "HTTP_CLIENT_IP",
    keys::REMOTE_ADDR,
];

/// The client address: the first source present, verbatim.
///
/// No syntax validation and no splitting of multi-hop `X-Forwarded-For`
/// lists happen here.
pub fn resolve_ip(env: &Environment) -> Option<&str> {
    SOURCES.iter().find_map(|key| env.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(pairs: &[(&str, &str)]) -> Option<String> {
        let env: Environment = pairs.iter().copied().collect();
        resolve_ip(&env).map(str::to_owned)
    }

    #[test]
    fn precedence_chain() {
        let remote = ("REMOTE_ADDR", "127.0.0.1");
        let client = ("CLIENT_IP", "127.0.0.2");
        let bare = ("X_FORWARDED_FOR", "127.0.0.3");
        let header = ("HTTP_X_FORWARDED_FOR", "127.0.0.4");

        assert_eq!(ip(&[remote]).as_deref(), Some("127.0.0.1"));
        assert_eq!(ip(&[remote, client]).as_deref(), Some("127.0.0.2"));
        assert_eq!(ip(&[remote, client, bare]).as_deref(), Some("127.0.0.3"));
        assert_eq!(ip(&[remote, client, header]).as_deref(), Some("127.0.0.4"));
        assert_eq!(ip(&[remote, client, bare, header]).as_deref(), Some("127.0.0.3"));
    }

    #[test]
    fn no_source_is_absent() {
        assert_eq!(ip(&[]), None);
    }

    #[test]
    fn list_values_pass_through() {
        assert_eq!(
            ip(&[("HTTP_X_FORWARDED_FOR", "203.0.113.5, 10.0.0.1")]).as_deref(),
            Some("203.0.113.5, 10.0.0.1"),
        );
    }
}
