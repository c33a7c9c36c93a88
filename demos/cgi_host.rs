//! A tiny hyper host that hands every transaction to envreq.
//!
//! The host owns the socket: it reads the full body, flattens the request head
//! into an [`Environment`] and lets [`Request`] normalize it. The response is
//! a plain-text summary of what envreq saw.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example cgi_host
//!
//! Try:
//!   curl 'http://localhost:3000/users?page=2'
//!   curl -X POST http://localhost:3000/users/42 \
//!        -H 'X-Http-Method-Override: PATCH' \
//!        -d 'name=alice&tags[]=a&tags[]=b'
//!   curl -X POST http://localhost:3000/users/42 -d '_METHOD=DELETE'
//!   curl http://localhost:3000/ -H 'X-Forwarded-For: 203.0.113.9'

use std::convert::Infallible;
use std::fmt::Write as _;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use envreq::log::{Logger, TracingWriter};
use envreq::{Environment, Request};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let addr: SocketAddr = "0.0.0.0:3000".parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "cgi_host listening");

    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(v) => v,
            Err(e) => {
                error!("accept error: {e}");
                continue;
            }
        };

        let io = TokioIo::new(stream);
        tokio::spawn(async move {
            let svc = service_fn(move |req| handle(req, remote_addr));
            if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                .serve_connection(io, svc)
                .await
            {
                error!(peer = %remote_addr, "connection error: {e}");
            }
        });
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

async fn handle(
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let mut log = Logger::new(TracingWriter);
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            log.warn_with("body read failed: {err}", &[("err", &e.to_string())]);
            return Ok(reply(http::StatusCode::BAD_REQUEST, "unreadable body\n".to_owned()));
        }
    };

    let env = Environment::from_http(&parts, &body, Some(remote_addr));
    let request = match Request::new(env) {
        Ok(r) => r,
        Err(e) if e.is_configuration() => {
            log.error(&format!("host wiring: {e}"));
            return Ok(reply(http::StatusCode::INTERNAL_SERVER_ERROR, format!("{e}\n")));
        }
        Err(e) => {
            log.notice(&format!("rejected: {e}"));
            return Ok(reply(http::StatusCode::METHOD_NOT_ALLOWED, format!("{e}\n")));
        }
    };

    let method = request.method().as_str();
    let path = request.path();
    log.info_with("{method} {path}", &[("method", method), ("path", &path)]);

    Ok(reply(http::StatusCode::OK, summarize(&request)))
}

fn summarize(req: &Request) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "method:   {}", req.method());
    if let Some(original) = req.original_method() {
        let _ = writeln!(out, "original: {original}");
    }
    let _ = writeln!(out, "url:      {}{}", req.url(), req.path());
    let _ = writeln!(out, "client:   {}", req.ip().unwrap_or("-"));
    let _ = writeln!(out, "agent:    {}", req.user_agent().unwrap_or("-"));
    if let Some(media) = req.media_type() {
        let _ = writeln!(out, "media:    {media} ({} bytes)", req.content_length());
    }

    let mut params: Vec<_> = req.params().iter().collect();
    params.sort_unstable();
    for (key, value) in params {
        let _ = writeln!(out, "param:    {key}={value}");
    }
    for (name, value) in req.cookies() {
        let _ = writeln!(out, "cookie:   {name}={value}");
    }
    out
}

fn reply(status: http::StatusCode, text: String) -> http::Response<Full<Bytes>> {
    let mut res = http::Response::new(Full::new(Bytes::from(text)));
    *res.status_mut() = status;
    res.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    res
}
