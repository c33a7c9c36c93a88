//! # envreq
//!
//! Turns a CGI-style environment map into a structured, read-only HTTP request.
//!
//! ## The contract
//!
//! The host server owns networking. It accepts the connection, terminates TLS,
//! reads the body, and describes the transaction as a flat map of strings:
//! `REQUEST_METHOD`, `QUERY_STRING`, `HTTP_*` headers, `SERVER_PORT`, the raw
//! body under `slim.input`, the scheme under `slim.url_scheme`. envreq does
//! not perform I/O and does not parse JSON or multipart bodies.
//!
//! What envreq does with that map:
//!
//! - **Method override**: a POST may tunnel PUT/PATCH/DELETE via
//!   `X-Http-Method-Override` or a `_METHOD` field
//! - **Headers**: one lookup for `accept-encoding`, `HTTP_ACCEPT_ENCODING`, ...
//! - **Parameters**: query, body and their union, body values winning
//! - **Content metadata**: media type, parameters, charset, length
//! - **Addressing**: scheme, host (IPv6 aware), port, script name, path info, URL
//! - **Client address**: forwarded-for precedence chain
//!
//! Plus two small collaborators: a level-filtered [`log::Logger`] and a
//! response [`CookieJar`].
//!
//! ## Quick start
//!
//! ```rust
//! use envreq::{Environment, Method, Request};
//!
//! let env = Environment::mock()
//!     .with("REQUEST_METHOD", "POST")
//!     .with("HTTP_HOST", "example.com:8080")
//!     .with("SERVER_PORT", "8080")
//!     .with("QUERY_STRING", "page=2&sort=name")
//!     .with("CONTENT_TYPE", "application/x-www-form-urlencoded")
//!     .with("slim.input", "_METHOD=PUT&sort=date");
//!
//! let req = Request::new(env).unwrap();
//!
//! assert_eq!(req.method(), Method::Put);
//! assert_eq!(req.original_method(), Some(Method::Post));
//! assert_eq!(req.param("sort"), Some("date"));
//! assert_eq!(req.param("page"), Some("2"));
//! assert_eq!(req.host(), "example.com");
//! assert_eq!(req.url(), "http://example.com:8080");
//! ```

mod client;
mod content;
mod cookies;
mod environment;
mod error;
mod headers;
mod location;
mod method;
mod params;
mod request;

pub mod log;

pub use client::resolve_ip;
pub use content::ContentMeta;
pub use cookies::{Cookie, CookieJar, parse_cookie_header};
pub use environment::{Environment, keys};
pub use error::Error;
pub use headers::HeaderIndex;
pub use location::Location;
pub use method::{Method, OVERRIDE_HEADER, OVERRIDE_PARAM};
pub use params::{Decoding, Params};
pub use request::{Request, RequestBuilder};
