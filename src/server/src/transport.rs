// Copyright © spellclash 2024-present
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! TLS termination and the WebSocket upgrade handshake at `/game`. Accepts
//! TCP connections, validates the upgrade request by hand (path, headers),
//! and hands each accepted socket off to a read/write pump that feeds
//! [crate::dispatch::dispatch].

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre::{eyre, Result, WrapErr};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::dispatch;
use crate::session::{ConnectionId, Session};

/// Filesystem locations of the TLS certificate and private key. Fixed
/// per-process; not environment-driven.
#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: String,
    pub key: String,
}

/// Binds `0.0.0.0:<port>`, terminates TLS with the certificate/key at
/// `tls`, and serves the `/game` WebSocket endpoint until the process is
/// killed. Every connection shares one [Session] behind a mutex.
pub async fn serve(port: u16, tls: TlsPaths) -> Result<()> {
    let acceptor = build_acceptor(&tls)?;
    let listener = TcpListener::bind(("0.0.0.0", port)).await.wrap_err_with(|| format!("binding 0.0.0.0:{port}"))?;
    info!(port, "listening for connections");

    let session = Arc::new(Mutex::new(Session::new()));

    loop {
        let (stream, peer) = listener.accept().await.wrap_err("accepting connection")?;
        let acceptor = acceptor.clone();
        let session = session.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, peer, acceptor, session).await {
                warn!(%peer, %err, "connection ended with an error");
            }
        });
    }
}

fn build_acceptor(tls: &TlsPaths) -> Result<TlsAcceptor> {
    let config = server_config(Path::new(&tls.cert), Path::new(&tls.key))?;
    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn server_config(cert_path: &Path, key_path: &Path) -> Result<ServerConfig> {
    let cert_bytes = fs::read(cert_path).wrap_err_with(|| format!("reading certificate {}", cert_path.display()))?;
    let key_bytes = fs::read(key_path).wrap_err_with(|| format!("reading private key {}", key_path.display()))?;

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut cert_bytes.as_slice())
        .collect::<std::result::Result<_, _>>()
        .wrap_err_with(|| format!("parsing certificate chain {}", cert_path.display()))?;
    verify_non_empty(&certs, cert_path)?;

    let key = match rustls_pemfile::pkcs8_private_keys(&mut key_bytes.as_slice()).next() {
        Some(Ok(key)) => PrivateKeyDer::Pkcs8(key),
        Some(Err(err)) => return Err(eyre!("invalid private key in {}: {err}", key_path.display())),
        None => return Err(eyre!("no PKCS#8 private key found in {}", key_path.display())),
    };

    ServerConfig::builder().with_no_client_auth().with_single_cert(certs, key).wrap_err("building TLS server config")
}

fn verify_non_empty(certs: &[CertificateDer<'static>], cert_path: &Path) -> Result<()> {
    if certs.is_empty() {
        return Err(eyre!("no certificates found in {}", cert_path.display()));
    }
    Ok(())
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, acceptor: TlsAcceptor, session: Arc<Mutex<Session>>) -> Result<()> {
    let tls_stream = acceptor.accept(stream).await.wrap_err("TLS handshake failed")?;
    let ws_stream = tokio_tungstenite::accept_hdr_async(tls_stream, validate_upgrade).await.wrap_err("websocket handshake failed")?;
    info!(%peer, "accepted websocket connection");

    let (mut sink, mut stream) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let id = ConnectionId::next();

    {
        let mut session = session.lock().await;
        session.add_connection(id, tx);
        session.broadcast_all(&session.hello());
    }

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let mut session = session.lock().await;
                dispatch::dispatch(&mut session, id, &text);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }

    {
        let mut session = session.lock().await;
        dispatch::disconnect(&mut session, id);
    }
    writer.abort();

    Ok(())
}

/// The manual handshake validation the design calls for: `/game` only,
/// standard upgrade headers present, version 13. Anything else is a 400 or
/// 404 instead of a completed upgrade.
fn validate_upgrade(request: &Request, response: Response) -> std::result::Result<Response, ErrorResponse> {
    if request.uri().path() != "/game" {
        return Err(error_response(404, "not found"));
    }

    let headers = request.headers();
    let upgrade_ok = headers.get("upgrade").and_then(|v| v.to_str().ok()).is_some_and(|v| v.eq_ignore_ascii_case("websocket"));
    let connection_ok = headers
        .get("connection")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|token| token.trim().eq_ignore_ascii_case("upgrade")));
    let key_ok = headers.get("sec-websocket-key").and_then(|v| v.to_str().ok()).is_some_and(|v| !v.is_empty());
    let version_ok = headers.get("sec-websocket-version").and_then(|v| v.to_str().ok()).is_some_and(|v| v == "13");

    if upgrade_ok && connection_ok && key_ok && version_ok {
        Ok(response)
    } else {
        Err(error_response(400, "bad websocket handshake"))
    }
}

fn error_response(status: u16, body: &str) -> ErrorResponse {
    http::Response::builder().status(status).body(Some(body.to_string())).expect("static response is well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str, headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder().uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    fn ok_headers() -> Vec<(&'static str, &'static str)> {
        vec![("upgrade", "websocket"), ("connection", "Upgrade"), ("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ=="), ("sec-websocket-version", "13")]
    }

    #[test]
    fn a_well_formed_upgrade_to_the_game_path_is_accepted() {
        let response = http::Response::builder().body(()).unwrap();
        assert!(validate_upgrade(&request("/game", &ok_headers()), response).is_ok());
    }

    #[test]
    fn any_other_path_is_404() {
        let response = http::Response::builder().body(()).unwrap();
        let err = validate_upgrade(&request("/", &ok_headers()), response).unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn a_missing_upgrade_header_is_400() {
        let headers: Vec<_> = ok_headers().into_iter().filter(|(name, _)| *name != "upgrade").collect();
        let response = http::Response::builder().body(()).unwrap();
        let err = validate_upgrade(&request("/game", &headers), response).unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn a_wrong_websocket_version_is_400() {
        let mut headers = ok_headers();
        headers.retain(|(name, _)| *name != "sec-websocket-version");
        headers.push(("sec-websocket-version", "8"));
        let response = http::Response::builder().body(()).unwrap();
        let err = validate_upgrade(&request("/game", &headers), response).unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn the_connection_header_is_matched_case_and_list_insensitively() {
        let headers = vec![
            ("upgrade", "WebSocket"),
            ("connection", "keep-alive, Upgrade"),
            ("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ=="),
            ("sec-websocket-version", "13"),
        ];
        let response = http::Response::builder().body(()).unwrap();
        assert!(validate_upgrade(&request("/game", &headers), response).is_ok());
    }
}
