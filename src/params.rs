//! Query-string and body parameters.
//!
//! Three namespaces: the query string, the body, and their union. The body
//! namespace exists only for verbs that carry one. In the union, body values
//! shadow query values with the same key.

use std::collections::HashMap;

use url::form_urlencoded;

use crate::content::ContentMeta;
use crate::environment::{Environment, keys};
use crate::error::Error;
use crate::method::Method;

/// How percent-escapes in urlencoded data become characters.
///
/// Both modes agree on ASCII input.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Decoding {
    /// Decoded bytes are read as UTF-8, invalid sequences replaced.
    #[default]
    Multibyte,
    /// Each decoded byte becomes one `char` (ISO-8859-1).
    SingleByte,
}

// ── Params ────────────────────────────────────────────────────────────────────

/// A multi-value parameter map.
///
/// Repeated keys and `key[]` keys collect every value; [`get`](Params::get)
/// returns the last one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    map: HashMap<String, Vec<String>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes an `application/x-www-form-urlencoded` string.
    pub fn decode(input: &str, decoding: Decoding) -> Self {
        let mut params = Self::new();
        match decoding {
            Decoding::Multibyte => {
                for (k, v) in form_urlencoded::parse(input.as_bytes()) {
                    params.append(&k, &v);
                }
            }
            Decoding::SingleByte => {
                for pair in input.split('&').filter(|p| !p.is_empty()) {
                    let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                    params.append(&latin1_decode(k), &latin1_decode(v));
                }
            }
        }
        params
    }

    /// Adds a value. `tags[]` is stored under `tags`; empty keys are dropped.
    pub fn append(&mut self, key: &str, value: &str) {
        let key = key.strip_suffix("[]").unwrap_or(key);
        if key.is_empty() {
            return;
        }
        self.map.entry(key.to_owned()).or_default().push(value.to_owned());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).and_then(|v| v.last()).map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.map.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool { self.map.contains_key(key) }

    /// Number of distinct keys.
    pub fn len(&self) -> usize { self.map.len() }
    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    /// Iterates `(key, last value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter()
            .filter_map(|(k, v)| v.last().map(|last| (k.as_str(), last.as_str())))
    }

    /// Union of `self` and `over`; keys in `over` replace keys in `self`.
    pub fn merged_with(&self, over: &Params) -> Params {
        let mut map = self.map.clone();
        map.extend(over.map.iter().map(|(k, v)| (k.clone(), v.clone())));
        Params { map }
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.append(k.as_ref(), v.as_ref());
        }
        params
    }
}

fn latin1_decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    urlencoding::decode_binary(spaced.as_bytes())
        .iter()
        .map(|&b| char::from(b))
        .collect()
}

// ── ParamStore ────────────────────────────────────────────────────────────────

/// The three parameter namespaces of one request.
#[derive(Clone, Debug, Default)]
pub(crate) struct ParamStore {
    query: Params,
    body: Option<Params>,
    merged: Params,
}

impl ParamStore {
    pub(crate) fn new(query: Params, body: Option<Params>) -> Self {
        let merged = match &body {
            Some(body) => query.merged_with(body),
            None => query.clone(),
        };
        Self { query, body, merged }
    }

    pub fn query(&self) -> &Params { &self.query }
    pub fn merged(&self) -> &Params { &self.merged }

    /// Body parameters, or `None` when the effective method carries no body.
    pub fn body(&self) -> Option<&Params> { self.body.as_ref() }
}

/// `application/x-www-form-urlencoded`, or a POST that sent no content type.
///
/// `method` is the method as declared by the transport, before any override,
/// so a POST tunnelling a PUT still counts as a form submission.
pub(crate) fn is_form_data(method: Method, content: &ContentMeta) -> bool {
    (method == Method::Post && content.content_type().is_none())
        || content.media_type() == Some(ContentMeta::FORM_URLENCODED)
}

/// Decodes the body parameters of a request.
///
/// Multipart bodies were consumed by the host, which passes the resulting
/// fields as `form`. Every other body needs the raw input; its absence means
/// the host is miswired.
pub(crate) fn decode_body(
    env: &Environment,
    original: Method,
    content: &ContentMeta,
    form: &Params,
    decoding: Decoding,
) -> Result<Params, Error> {
    if content.media_type() == Some(ContentMeta::MULTIPART_FORM_DATA) {
        return Ok(form.clone());
    }
    let input = env.get(keys::INPUT).ok_or(Error::MissingEnv(keys::INPUT))?;
    if is_form_data(original, content) {
        Ok(Params::decode(input, decoding))
    } else {
        Ok(form.clone())
    }
}
