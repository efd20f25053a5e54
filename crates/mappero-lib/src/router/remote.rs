//! Shared plumbing for HTTP routing backends.
//!
//! Every remote backend follows the same wire contract: a GET request whose
//! query carries the percent-encoded `from`/`to` texts, answered with a GPX
//! document. The request runs on a spawned task and completes the callback
//! exactly once.

use super::http::HttpTransport;
use super::{RouteCallback, RouteResult, RouterError};
use crate::codec::{Gpx, PathReader, XmlTokens};
use crate::{PathData, runtime};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::sync::Arc;

/// Characters left unescaped in query values: alphanumerics and the URI
/// "mark" characters
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a free-form location for use as a query value
pub fn escape(text: &str) -> String {
    utf8_percent_encode(text, QUERY_VALUE).to_string()
}

/// Decode a routing service response into a path.
///
/// Anything that is not an XML document, fails to parse, or holds no points
/// is reported as an unsolvable query.
pub(crate) fn parse_route(body: &[u8]) -> RouteResult {
    if !body.starts_with(b"<?xml") {
        return Err(RouterError::InvalidAddress(
            "routing service did not return an XML document".into(),
        ));
    }

    let mut path = PathData::new();
    Gpx::default()
        .read(&mut XmlTokens::new(body), &mut path)
        .map_err(|e| {
            tracing::debug!(error = %e, "Routing response could not be parsed");
            RouterError::InvalidAddress(format!("unusable routing response: {e}"))
        })?;

    if path.is_empty() {
        return Err(RouterError::InvalidAddress("no route found".into()));
    }
    Ok(path)
}

pub(crate) async fn fetch_route<C: HttpTransport>(transport: &C, url: &str) -> RouteResult {
    let body = transport.get(url).await?;
    parse_route(&body)
}

/// Run the request in the background and hand its outcome to `callback`.
/// Without a tokio runtime the callback fails immediately.
pub(crate) fn spawn_route_request<C: HttpTransport>(
    router: &'static str,
    transport: Arc<C>,
    url: String,
    callback: RouteCallback,
) {
    if !runtime::in_runtime_context() {
        callback(Err(RouterError::Generic(format!(
            "{router}: remote routing needs a tokio runtime"
        ))));
        return;
    }

    tracing::debug!(router, url = %url, "Starting route request");
    runtime::spawn(async move {
        let result = fetch_route(transport.as_ref(), &url).await;
        match &result {
            Ok(path) => tracing::debug!(router, points = path.len(), "Route received"),
            Err(e) => tracing::debug!(router, error = %e, "Route request failed"),
        }
        callback(result);
    });
}
