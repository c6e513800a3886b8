//! One-shot loopback listener that captures the authorization redirect.
//!
//! Binds `127.0.0.1` on an ephemeral port, accepts exactly one connection,
//! answers it with a short HTML page and closes.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// Upper bound on the request head we are willing to buffer.
const MAX_REQUEST_BYTES: usize = 16 * 1024;

const SUCCESS_PAGE: &str = "<html><body><h1>Authorization complete</h1>\
    <p>You may close this window and return to sendgmail.</p></body></html>";

/// Authorization code delivered on the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    /// Authorization code to exchange.
    pub code: String,
    /// Echoed `state` parameter.
    pub state: String,
}

/// Loopback redirect listener.
#[derive(Debug)]
pub struct RedirectListener {
    listener: TcpListener,
    addr: SocketAddr,
}

impl RedirectListener {
    /// Binds to a random free port on `127.0.0.1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        debug!(%addr, "redirect listener bound");
        Ok(Self { listener, addr })
    }

    /// Returns the bound port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Returns the redirect URI to register with the authorization request.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/", self.port())
    }

    /// Waits for the single redirect and returns the authorization code.
    ///
    /// Consumes the listener, so the port is released on return.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateMismatch`] if the echoed state differs from
    /// `expected_state`, [`Error::AccessDenied`] if the user declined, and
    /// [`Error::OAuth`] for any other error reported on the redirect.
    pub async fn accept(self, expected_state: &str) -> Result<Callback> {
        let (mut socket, peer) = self.listener.accept().await?;
        debug!(%peer, "redirect received");

        let mut buf = Vec::with_capacity(1024);
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() >= MAX_REQUEST_BYTES {
                break;
            }
        }

        let request = String::from_utf8_lossy(&buf);
        let result = parse_redirect(&request, expected_state);

        let (status, page) = match &result {
            Ok(_) => ("200 OK", SUCCESS_PAGE.to_string()),
            Err(e) => (
                "400 Bad Request",
                format!(
                    "<html><body><h1>Authorization failed</h1><p>{}</p></body></html>",
                    html_escape(&e.to_string())
                ),
            ),
        };
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{page}",
            page.len()
        );
        if let Err(e) = socket.write_all(response.as_bytes()).await {
            warn!("failed to answer redirect: {e}");
        }
        if let Err(e) = socket.shutdown().await {
            debug!("failed to close redirect connection: {e}");
        }

        result
    }
}

/// Extracts the authorization code from a raw HTTP request head.
pub(crate) fn parse_redirect(request: &str, expected_state: &str) -> Result<Callback> {
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| Error::InvalidRedirect("empty request".to_string()))?;

    let url = Url::parse("http://localhost")?.join(target)?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return Err(Error::StateMismatch);
    }

    if let Some(error) = error {
        if error == "access_denied" {
            return Err(Error::AccessDenied);
        }
        let description = description.unwrap_or_default();
        return Err(Error::oauth_error(error, description));
    }

    let code = code.ok_or_else(|| Error::InvalidRedirect("no code parameter".to_string()))?;

    Ok(Callback {
        code,
        state: expected_state.to_string(),
    })
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
