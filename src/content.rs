//! `Content-Type` and `Content-Length` decomposition.

use std::collections::HashMap;

use crate::headers::HeaderIndex;

/// Body metadata derived from the request headers.
///
/// Every field derived from `Content-Type` is `None` when the header was not
/// sent, so "no content type" stays distinguishable from "content type
/// without a charset".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentMeta {
    content_type: Option<String>,
    media_type: Option<String>,
    media_type_params: HashMap<String, String>,
    length: u64,
}

impl ContentMeta {
    pub const FORM_URLENCODED: &'static str = "application/x-www-form-urlencoded";
    pub const MULTIPART_FORM_DATA: &'static str = "multipart/form-data";

    pub fn from_headers(headers: &HeaderIndex) -> Self {
        let length = headers.get("Content-Length")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);

        let Some(raw) = headers.get("Content-Type") else {
            return Self { length, ..Self::default() };
        };

        let mut parts = raw.split(';');
        let media_type = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let media_type_params = parts
            .filter_map(|segment| segment.split_once('='))
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_owned()))
            .filter(|(name, _)| !name.is_empty())
            .collect();

        Self {
            content_type: Some(raw.to_owned()),
            media_type: Some(media_type),
            media_type_params,
            length,
        }
    }

    /// The header exactly as sent, parameters included.
    pub fn content_type(&self) -> Option<&str> { self.content_type.as_deref() }

    /// `type/subtype`, lower-cased, without parameters.
    pub fn media_type(&self) -> Option<&str> { self.media_type.as_deref() }

    pub fn media_type_params(&self) -> &HashMap<String, String> { &self.media_type_params }

    pub fn charset(&self) -> Option<&str> {
        self.media_type_params.get("charset").map(String::as_str)
    }

    /// `Content-Length`, or 0 when absent or not a number.
    pub fn length(&self) -> u64 { self.length }
}
