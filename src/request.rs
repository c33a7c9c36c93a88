//! Incoming HTTP request type.

use std::collections::HashMap;

use tracing::trace;

use crate::client;
use crate::content::ContentMeta;
use crate::cookies::parse_cookie_header;
use crate::environment::{Environment, keys};
use crate::error::Error;
use crate::headers::HeaderIndex;
use crate::location::Location;
use crate::method::{self, Method, Resolved};
use crate::params::{self, Decoding, ParamStore, Params};

/// An inbound request, normalized from its CGI environment.
///
/// Every derived view is computed once in [`RequestBuilder::build`]. After
/// that the request is read-only: accessors never fail on missing data, they
/// return `None` or the caller's default.
#[derive(Clone, Debug)]
pub struct Request {
    env: Environment,
    method: Method,
    original_method: Option<Method>,
    headers: HeaderIndex,
    content: ContentMeta,
    location: Location,
    params: ParamStore,
    cookies: HashMap<String, String>,
}

impl Request {
    /// Builds a request with default settings. See [`Request::builder`].
    pub fn new(env: Environment) -> Result<Self, Error> {
        Self::builder(env).build()
    }

    pub fn builder(env: Environment) -> RequestBuilder {
        RequestBuilder { env, form: Params::new(), decoding: Decoding::default() }
    }

    // ── Method ────────────────────────────────────────────────────────────────

    /// The effective method, after any override.
    pub fn method(&self) -> Method { self.method }

    /// The method declared by the transport, when an override replaced it.
    pub fn original_method(&self) -> Option<Method> { self.original_method }

    pub fn is_get(&self) -> bool { self.method == Method::Get }
    pub fn is_post(&self) -> bool { self.method == Method::Post }
    pub fn is_put(&self) -> bool { self.method == Method::Put }
    pub fn is_patch(&self) -> bool { self.method == Method::Patch }
    pub fn is_delete(&self) -> bool { self.method == Method::Delete }
    pub fn is_head(&self) -> bool { self.method == Method::Head }
    pub fn is_options(&self) -> bool { self.method == Method::Options }

    /// Sent by `XMLHttpRequest`, or flagged with a truthy `isajax` parameter.
    pub fn is_ajax(&self) -> bool {
        let flagged = self.param("isajax").is_some_and(|v| !v.is_empty() && v != "0");
        flagged || self.header("X-Requested-With") == Some("XMLHttpRequest")
    }

    pub fn is_xhr(&self) -> bool { self.is_ajax() }

    /// Whether the body is a form submission. Decided on the declared
    /// method, so a POST overridden to PUT still qualifies.
    pub fn is_form_data(&self) -> bool {
        params::is_form_data(self.original_method.unwrap_or(self.method), &self.content)
    }

    // ── Parameters ────────────────────────────────────────────────────────────

    /// Union of query and body parameters; body values win.
    pub fn params(&self) -> &Params { self.params.merged() }

    pub fn param(&self, key: &str) -> Option<&str> { self.params.merged().get(key) }

    pub fn param_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.param(key).unwrap_or(default)
    }

    /// Query-string parameters, whatever the method.
    pub fn query(&self) -> &Params { self.params.query() }

    pub fn get(&self, key: &str) -> Option<&str> { self.params.query().get(key) }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Body parameters. Fails on requests whose method carries no body.
    pub fn body_params(&self) -> Result<&Params, Error> {
        self.params.body().ok_or(Error::BodyUnavailable(self.method))
    }

    pub fn post(&self, key: &str) -> Result<Option<&str>, Error> { self.body_param(key) }
    pub fn put(&self, key: &str) -> Result<Option<&str>, Error> { self.body_param(key) }
    pub fn patch(&self, key: &str) -> Result<Option<&str>, Error> { self.body_param(key) }
    pub fn delete(&self, key: &str) -> Result<Option<&str>, Error> { self.body_param(key) }

    fn body_param(&self, key: &str) -> Result<Option<&str>, Error> {
        Ok(self.body_params()?.get(key))
    }

    // ── Headers and body ──────────────────────────────────────────────────────

    pub fn headers(&self) -> &HeaderIndex { &self.headers }
    pub fn header(&self, name: &str) -> Option<&str> { self.headers.get(name) }

    /// The raw body as supplied by the host, or `""`.
    pub fn body(&self) -> &str { self.env.get(keys::INPUT).unwrap_or("") }

    pub fn content(&self) -> &ContentMeta { &self.content }
    pub fn content_type(&self) -> Option<&str> { self.content.content_type() }
    pub fn media_type(&self) -> Option<&str> { self.content.media_type() }
    pub fn media_type_params(&self) -> &HashMap<String, String> { self.content.media_type_params() }
    pub fn content_charset(&self) -> Option<&str> { self.content.charset() }
    pub fn content_length(&self) -> u64 { self.content.length() }

    pub fn cookies(&self) -> &HashMap<String, String> { &self.cookies }
    pub fn cookie(&self, name: &str) -> Option<&str> { self.cookies.get(name).map(String::as_str) }

    pub fn referrer(&self) -> Option<&str> { self.header("Referer") }
    pub fn referer(&self) -> Option<&str> { self.referrer() }
    pub fn user_agent(&self) -> Option<&str> { self.header("User-Agent") }

    // ── Location ──────────────────────────────────────────────────────────────

    pub fn location(&self) -> &Location { &self.location }
    pub fn scheme(&self) -> &str { self.location.scheme() }
    pub fn host(&self) -> &str { self.location.host() }
    pub fn host_with_port(&self) -> String { self.location.host_with_port() }
    pub fn port(&self) -> u16 { self.location.port() }
    pub fn script_name(&self) -> &str { self.location.script_name() }
    pub fn root_uri(&self) -> &str { self.location.root_uri() }
    pub fn path(&self) -> String { self.location.path() }
    pub fn path_info(&self) -> &str { self.location.path_info() }
    pub fn resource_uri(&self) -> &str { self.location.resource_uri() }
    pub fn url(&self) -> String { self.location.url() }

    /// Client address from the forwarding chain; see [`resolve_ip`](crate::resolve_ip).
    pub fn ip(&self) -> Option<&str> { client::resolve_ip(&self.env) }

    pub fn environment(&self) -> &Environment { &self.env }
}

// ── RequestBuilder ────────────────────────────────────────────────────────────

/// Configures request construction.
///
/// Obtain via [`Request::builder`].
pub struct RequestBuilder {
    env: Environment,
    form: Params,
    decoding: Decoding,
}

impl RequestBuilder {
    /// Form fields the host already decoded from a multipart body. Also used
    /// as the body of non-form payloads such as JSON, where it is usually
    /// empty.
    pub fn form(mut self, form: Params) -> Self {
        self.form = form;
        self
    }

    pub fn decoding(mut self, decoding: Decoding) -> Self {
        self.decoding = decoding;
        self
    }

    /// Normalizes the environment.
    ///
    /// The method override is resolved first: it decides whether a body
    /// exists at all. Fails when `REQUEST_METHOD` is missing or unsupported,
    /// or when a body-carrying request has no raw input and is not multipart.
    pub fn build(self) -> Result<Request, Error> {
        let Self { env, form, decoding } = self;

        let headers = HeaderIndex::from_env(&env);
        let content = ContentMeta::from_headers(&headers);
        let query = Params::decode(env.get(keys::QUERY_STRING).unwrap_or(""), decoding);

        let declared: Method = env.get(keys::REQUEST_METHOD)
            .ok_or(Error::MissingEnv(keys::REQUEST_METHOD))?
            .trim()
            .to_ascii_uppercase()
            .parse()?;

        let upstream = env.get(keys::ORIGINAL_METHOD)
            .and_then(|m| m.trim().to_ascii_uppercase().parse::<Method>().ok());

        // Without a header override the POST body is decoded early to find
        // `_METHOD`, and it remains the body of the tunnelled verb.
        let (resolved, mut body) = match upstream {
            Some(original) => (Resolved { effective: declared, original: Some(original) }, None),
            None if declared == Method::Post => match method::header_override(&headers) {
                Some(resolved) => (resolved, None),
                None => {
                    let body = params::decode_body(&env, Method::Post, &content, &form, decoding)?;
                    (method::param_override(&body, &query), Some(body))
                }
            },
            None => (Resolved::declared(declared), None),
        };

        if !resolved.effective.carries_body() {
            body = None;
        } else if body.is_none() {
            let original = resolved.original.unwrap_or(resolved.effective);
            body = Some(params::decode_body(&env, original, &content, &form, decoding)?);
        }

        let location = Location::from_env(&env, &headers);
        let cookies = headers.get("Cookie").map(parse_cookie_header).unwrap_or_default();

        trace!(
            method = %resolved.effective,
            path = %location.path(),
            headers = headers.len(),
            body = body.as_ref().map_or(0, Params::len),
            "request normalized"
        );

        Ok(Request {
            method: resolved.effective,
            original_method: resolved.original,
            params: ParamStore::new(query, body),
            env,
            headers,
            content,
            location,
            cookies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock(pairs: &[(&str, &str)]) -> Environment {
        let mut env = Environment::mock();
        env.extend(pairs.iter().copied());
        env
    }

    fn request(pairs: &[(&str, &str)]) -> Request {
        Request::new(mock(pairs)).unwrap()
    }

    #[test]
    fn declared_method_without_override() {
        for name in ["GET", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH"] {
            let req = request(&[("REQUEST_METHOD", name), ("HTTP_X_HTTP_METHOD_OVERRIDE", "POST")]);
            assert_eq!(req.method().as_str(), name);
            assert_eq!(req.original_method(), None);
        }
    }

    #[test]
    fn override_keeps_original_post() {
        let req = request(&[("REQUEST_METHOD", "POST"), ("X_HTTP_METHOD_OVERRIDE", "PUT")]);
        assert!(req.is_put());
        assert_eq!(req.original_method(), Some(Method::Post));
        assert!(req.is_form_data());
    }

    #[test]
    fn override_from_body_field() {
        let req = request(&[
            ("REQUEST_METHOD", "POST"),
            ("CONTENT_TYPE", "application/x-www-form-urlencoded"),
            ("slim.input", "_METHOD=delete&id=7"),
        ]);
        assert!(req.is_delete());
        assert_eq!(req.delete("id").unwrap(), Some("7"));
    }

    #[test]
    fn override_to_get_drops_the_body() {
        let req = request(&[("REQUEST_METHOD", "POST"), ("HTTP_X_HTTP_METHOD_OVERRIDE", "GET")]);
        assert!(req.is_get());
        assert!(matches!(req.post("x"), Err(Error::BodyUnavailable(Method::Get))));
    }

    #[test]
    fn header_override_to_bodyless_method_needs_no_input() {
        for name in ["GET", "HEAD", "OPTIONS"] {
            let mut env = mock(&[("REQUEST_METHOD", "POST"), ("HTTP_X_HTTP_METHOD_OVERRIDE", name)]);
            env.remove(keys::INPUT);
            let req = Request::new(env).unwrap();
            assert_eq!(req.method().as_str(), name);
            assert_eq!(req.original_method(), Some(Method::Post));
            assert!(matches!(req.post("x"), Err(Error::BodyUnavailable(_))));
        }
    }

    #[test]
    fn header_override_to_body_method_still_needs_input() {
        let mut env = mock(&[("REQUEST_METHOD", "POST"), ("HTTP_X_HTTP_METHOD_OVERRIDE", "PUT"), ("CONTENT_TYPE", "application/x-www-form-urlencoded")]);
        env.remove(keys::INPUT);
        assert!(matches!(Request::new(env), Err(Error::MissingEnv(keys::INPUT))));
    }

    #[test]
    fn header_override_beats_body_field() {
        let req = request(&[
            ("REQUEST_METHOD", "POST"),
            ("HTTP_X_HTTP_METHOD_OVERRIDE", "PATCH"),
            ("CONTENT_TYPE", "application/x-www-form-urlencoded"),
            ("slim.input", "_METHOD=DELETE&name=alice"),
        ]);
        assert!(req.is_patch());
        assert_eq!(req.patch("name").unwrap(), Some("alice"));
    }

    #[test]
    fn upstream_override_is_honored() {
        let req = request(&[("REQUEST_METHOD", "PUT"), ("slim.method_override.original_method", "POST")]);
        assert!(req.is_put());
        assert!(req.is_form_data());
    }

    #[test]
    fn missing_or_unknown_method() {
        let mut env = Environment::mock();
        env.remove("REQUEST_METHOD");
        assert!(matches!(Request::new(env), Err(Error::MissingEnv("REQUEST_METHOD"))));
        assert!(matches!(
            Request::new(mock(&[("REQUEST_METHOD", "BREW")])),
            Err(Error::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn ajax_detection() {
        assert!(request(&[("X_REQUESTED_WITH", "XMLHttpRequest")]).is_ajax());
        assert!(request(&[("QUERY_STRING", "isajax=1")]).is_xhr());
        assert!(!request(&[("QUERY_STRING", "isajax=0")]).is_ajax());
        assert!(!request(&[("X_REQUESTED_WITH", "foo")]).is_ajax());
        assert!(!request(&[]).is_ajax());
    }

    #[test]
    fn single_byte_decoding_from_builder() {
        let req = Request::builder(mock(&[("QUERY_STRING", "one=1&two=2&three=3")]))
            .decoding(Decoding::SingleByte)
            .build()
            .unwrap();
        assert_eq!(req.query().len(), 3);
        assert_eq!(req.get("one"), Some("1"));
        assert_eq!(req.get_or("foo", "none"), "none");
    }
}
