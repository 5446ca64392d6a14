//! Local HTTP listener that receives the Azure AD sign-in redirect.
//!
//! Binds to the host and port of the configured redirect URI, answers one
//! browser request on the redirect path and hands back the full callback URL.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use url::Url;

use crate::error::AuthError;

pub struct CallbackListener {
    listener: TcpListener,
    host: String,
    path: String,
}

impl CallbackListener {
    /// Bind to the address named by `redirect_uri` (e.g. `http://localhost:28491/callback`).
    pub fn bind(redirect_uri: &str) -> Result<Self, AuthError> {
        let url = Url::parse(redirect_uri)
            .map_err(|e| AuthError::OAuthFailed(format!("invalid redirect_uri: {e}")))?;

        if url.scheme() != "http" {
            return Err(AuthError::OAuthFailed(
                "local sign-in needs an http:// redirect_uri".into(),
            ));
        }

        let host = url.host_str().unwrap_or("localhost").to_string();
        let port = url.port_or_known_default().unwrap_or(80);
        let bind_host = if host == "localhost" { "127.0.0.1" } else { host.as_str() };
        let addr = format!("{}:{}", bind_host, port);

        let listener = TcpListener::bind(&addr).map_err(|e| {
            error!("Failed to bind callback listener to {}: {}", addr, e);
            AuthError::OAuthFailed(format!("failed to start callback listener: {e}"))
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|e| AuthError::OAuthFailed(format!("listener configuration error: {e}")))?;

        info!("OAuth callback listener on {}", addr);

        Ok(Self {
            listener,
            host,
            path: url.path().to_string(),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// Block until a callback arrives or `timeout` elapses.
    ///
    /// Returns the full callback URL including its query string.
    pub fn wait(&self, timeout: Duration) -> Result<String, AuthError> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.listener.accept() {
                Ok((stream, peer_addr)) => {
                    debug!("Connection from {}", peer_addr);
                    if let Some(target) = self.handle_connection(stream) {
                        info!("OAuth callback received");
                        let port = self.local_addr().map(|a| a.port()).unwrap_or_default();
                        return Ok(format!("http://{}:{}{}", self.host, port, target));
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(AuthError::OAuthFailed(
                            "timed out waiting for the sign-in callback".into(),
                        ));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    return Err(AuthError::OAuthFailed(format!("connection error: {e}")));
                }
            }
        }
    }

    /// Returns the request target if this was the OAuth redirect.
    fn handle_connection(&self, mut stream: TcpStream) -> Option<String> {
        let _ = stream.set_nonblocking(false);
        let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));

        let mut buffer = [0; 4096];
        let bytes_read = match stream.read(&mut buffer) {
            Ok(n) => n,
            Err(e) => {
                debug!("Failed to read request: {}", e);
                return None;
            }
        };

        let request = String::from_utf8_lossy(&buffer[..bytes_read]);
        let request_line = request.lines().next()?;
        let mut parts = request_line.split_whitespace();
        let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
            send_response(&mut stream, "400 Bad Request", "text/plain", "Bad Request");
            return None;
        };

        if method != "GET" {
            send_response(&mut stream, "405 Method Not Allowed", "text/plain", "Method Not Allowed");
            return None;
        }

        let path = target.split('?').next().unwrap_or_default();
        if path != self.path {
            send_response(&mut stream, "404 Not Found", "text/plain", "Not Found");
            return None;
        }

        let query: HashMap<String, String> = target
            .split_once('?')
            .map(|(_, q)| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        if query.contains_key("error") {
            let description = query
                .get("error_description")
                .cloned()
                .unwrap_or_else(|| "Authentication was cancelled or failed.".to_string());
            send_response(&mut stream, "200 OK", "text/html; charset=utf-8", &result_page(false, &description));
            return Some(target.to_string());
        }

        if !query.contains_key("code") {
            send_response(&mut stream, "400 Bad Request", "text/plain", "Missing authorization code");
            return None;
        }

        send_response(
            &mut stream,
            "200 OK",
            "text/html; charset=utf-8",
            &result_page(true, "You are signed in to Power BI."),
        );
        Some(target.to_string())
    }
}

fn result_page(success: bool, message: &str) -> String {
    let title = if success {
        "Authentication Successful"
    } else {
        "Authentication Failed"
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"UTF-8\"><title>{title}</title></head>\n\
         <body style=\"font-family: sans-serif; text-align: center; margin-top: 4rem\">\n\
         <h1>{title}</h1>\n<p>{}</p>\n<p>You can close this tab now.</p>\n</body>\n</html>",
        html_escape(message)
    )
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn send_response(stream: &mut TcpStream, status: &str, content_type: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );

    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
