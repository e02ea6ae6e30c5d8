//! Connect URL construction

use crate::traits::{Connection, HubSocketError, Result};
use url::Url;

/// Build the URL for the next connection attempt
///
/// `started` selects the `/reconnect` context path over `/connect` once a
/// connection has been established before. The scheme is always rewritten to
/// the WebSocket pair: `wss` for `https`/`wss` bases, `ws` for everything else.
pub fn build_connect_url(
    connection: &dyn Connection,
    started: bool,
    transport_type: &str,
) -> Result<Url> {
    let mut target = connection.web_sockets_url().trim_end_matches('/').to_string();

    if connection.use_default_context_paths() {
        target.push('/');
        target.push_str(if started { "reconnect" } else { "connect" });
    }

    let default_query = connection.use_default_query_string();
    if default_query {
        target.push_str(&connection.receive_query_string(transport_type));
    }

    let extra = connection.additional_query_string();
    if !extra.is_empty() {
        target.push(if default_query { '&' } else { '?' });
        let pairs: Vec<String> = extra
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        target.push_str(&pairs.join("&"));
    }

    let rewritten = rewrite_scheme(&target)?;
    Url::parse(&rewritten).map_err(|e| HubSocketError::InvalidUrl(format!("{}: {}", target, e)))
}

/// WebSocket scheme for a base scheme, compared case-insensitively
pub fn websocket_scheme(scheme: &str) -> &'static str {
    match scheme.to_ascii_lowercase().as_str() {
        "https" | "wss" => "wss",
        _ => "ws",
    }
}

/// Replace the scheme of `target` with `ws` or `wss`
///
/// Done on the string before parsing, since `Url` refuses to move a
/// non-special scheme such as `signalr` to `ws`.
pub fn rewrite_scheme(target: &str) -> Result<String> {
    match target.split_once("://") {
        Some((scheme, rest)) if !scheme.is_empty() => {
            Ok(format!("{}://{}", websocket_scheme(scheme), rest))
        }
        _ => Err(HubSocketError::InvalidUrl(format!("{}: missing scheme", target))),
    }
}
