//! HTTP method as a typed enum, and method-override resolution.
//!
//! HTML forms can only submit GET and POST. Clients tunnel the other verbs
//! through a POST carrying either an `X-Http-Method-Override` header or a
//! `_METHOD` form field. The override is resolved once, before any body is
//! interpreted, because the effective method decides whether a body exists.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::Error;
use crate::headers::HeaderIndex;
use crate::params::Params;

/// Header consulted for a tunnelled method.
pub const OVERRIDE_HEADER: &str = "X-Http-Method-Override";

/// Form or query field consulted for a tunnelled method.
pub const OVERRIDE_PARAM: &str = "_METHOD";

/// A supported HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
        }
    }

    /// Whether requests with this method have their body decoded into
    /// parameters.
    pub fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            _         => Err(Error::UnsupportedMethod(s.to_owned())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Delete  => http::Method::DELETE,
            Method::Get     => http::Method::GET,
            Method::Head    => http::Method::HEAD,
            Method::Options => http::Method::OPTIONS,
            Method::Patch   => http::Method::PATCH,
            Method::Post    => http::Method::POST,
            Method::Put     => http::Method::PUT,
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = Error;

    fn try_from(m: &http::Method) -> Result<Self, Self::Error> {
        m.as_str().parse()
    }
}

// ── Override resolution ───────────────────────────────────────────────────────

/// Outcome of method-override resolution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Resolved {
    pub effective: Method,
    /// The declared method, kept only when an override replaced it.
    pub original: Option<Method>,
}

impl Resolved {
    pub fn declared(method: Method) -> Self {
        Self { effective: method, original: None }
    }
}

/// Resolves a declared `POST` from the override header alone.
///
/// Returns `None` when the header is absent or empty, in which case the body
/// must be decoded so [`param_override`] can look for `_METHOD`. A header
/// value outside the supported set settles the request as a `POST`.
pub(crate) fn header_override(headers: &HeaderIndex) -> Option<Resolved> {
    headers.get(OVERRIDE_HEADER)
        .filter(|v| !v.is_empty())
        .map(apply_override)
}

/// Resolves a declared `POST` from `_METHOD` in the decoded body, then in the
/// query string. The first non-empty value wins.
pub(crate) fn param_override(body: &Params, query: &Params) -> Resolved {
    body.get(OVERRIDE_PARAM)
        .filter(|v| !v.is_empty())
        .or_else(|| query.get(OVERRIDE_PARAM).filter(|v| !v.is_empty()))
        .map_or(Resolved::declared(Method::Post), apply_override)
}

fn apply_override(raw: &str) -> Resolved {
    match raw.trim().to_ascii_uppercase().parse::<Method>() {
        Ok(effective) => {
            debug!(original = "POST", effective = %effective, "method override applied");
            Resolved { effective, original: Some(Method::Post) }
        }
        Err(e) => {
            warn!(value = raw, "ignoring method override: {e}");
            Resolved::declared(Method::Post)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;

    fn headers(pairs: &[(&str, &str)]) -> HeaderIndex {
        let env: Environment = pairs.iter().copied().collect();
        HeaderIndex::from_env(&env)
    }

    #[test]
    fn parses_wire_names_case_sensitively() {
        assert_eq!("PATCH".parse::<Method>().unwrap(), Method::Patch);
        assert!("patch".parse::<Method>().is_err());
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn body_verbs() {
        assert!(Method::Post.carries_body());
        assert!(Method::Delete.carries_body());
        assert!(!Method::Get.carries_body());
        assert!(!Method::Head.carries_body());
    }

    #[test]
    fn header_override_is_uppercased() {
        let r = header_override(&headers(&[("HTTP_X_HTTP_METHOD_OVERRIDE", "put")])).unwrap();
        assert_eq!(r.effective, Method::Put);
        assert_eq!(r.original, Some(Method::Post));
    }

    #[test]
    fn missing_header_defers_to_params() {
        assert_eq!(header_override(&headers(&[])), None);
        assert_eq!(header_override(&headers(&[("HTTP_X_HTTP_METHOD_OVERRIDE", "")])), None);
    }

    #[test]
    fn body_param_then_query_param() {
        let query: Params = [("_METHOD", "PUT")].into_iter().collect();
        let r = param_override(&Params::new(), &query);
        assert_eq!(r.effective, Method::Put);

        let body: Params = [("_METHOD", "DELETE")].into_iter().collect();
        let r = param_override(&body, &query);
        assert_eq!(r.effective, Method::Delete);
    }

    #[test]
    fn unknown_override_keeps_post() {
        let r = header_override(&headers(&[("HTTP_X_HTTP_METHOD_OVERRIDE", "BREW")]));
        assert_eq!(r, Some(Resolved::declared(Method::Post)));

        let body: Params = [("_METHOD", "")].into_iter().collect();
        assert_eq!(param_override(&body, &Params::new()), Resolved::declared(Method::Post));
    }

    #[test]
    fn converts_to_http_method() {
        assert_eq!(http::Method::from(Method::Options), http::Method::OPTIONS);
        assert_eq!(Method::try_from(&http::Method::HEAD).unwrap(), Method::Head);
        assert!(Method::try_from(&http::Method::TRACE).is_err());
    }
}
