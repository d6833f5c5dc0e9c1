// File: http.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::{ConfigParameter, TransportKind};
use crate::errors::{CoreResult, ProbeError};
use crate::httpinner::{response_complete, response_framing, ResponseFraming};
use crate::request::HttpRequest;
use crate::service::HttpService;
use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, trace, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::{rustls, TlsConnector};

/// Headers reqwest derives itself from the URL, body and connection pool.
const REBUILT_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
];

pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        service: &'a HttpService,
        request: &'a [u8],
    ) -> BoxFuture<'a, CoreResult<Vec<u8>>>;
}

pub fn build_transport(config: &ConfigParameter) -> CoreResult<Arc<dyn Transport>> {
    match config.transport() {
        TransportKind::Raw => {
            if config.proxy().is_some() {
                warn!("Proxy setting is ignored by the raw transport");
            }
            Ok(Arc::new(RawTransport::new(config)))
        }
        TransportKind::Reqwest => Ok(Arc::new(ReqwestTransport::new(config)?)),
    }
}

/// Writes the request bytes unchanged to a TCP or TLS socket.
pub struct RawTransport {
    connect_timeout: Duration,
    read_timeout: Duration,
    max_response_size: usize,
    tls: TlsConnector,
}

impl RawTransport {
    pub fn new(config: &ConfigParameter) -> Self {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
            rustls::OwnedTrustAnchor::from_subject_spki_name_constraints(
                ta.subject,
                ta.spki,
                ta.name_constraints,
            )
        }));

        let tls_config = rustls::ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        RawTransport {
            connect_timeout: Duration::from_secs(config.timeout()),
            read_timeout: Duration::from_secs(config.timeout()),
            max_response_size: config.max_response_size(),
            tls: TlsConnector::from(Arc::new(tls_config)),
        }
    }

    async fn send_raw(&self, service: &HttpService, request: &[u8]) -> CoreResult<Vec<u8>> {
        let stream = tokio::time::timeout(
            self.connect_timeout,
            TcpStream::connect((service.host.as_str(), service.port)),
        )
        .await
        .map_err(|_| ProbeError::Transport(format!("Connection timeout to {}", service)))?
        .map_err(|e| ProbeError::Transport(format!("Connection to {} failed: {}", service, e)))?;

        if service.secure {
            let domain = rustls::ServerName::try_from(service.host.as_str()).map_err(|e| {
                ProbeError::Transport(format!("Invalid TLS server name {}: {}", service.host, e))
            })?;
            let tls_stream = self.tls.connect(domain, stream).await.map_err(|e| {
                ProbeError::Transport(format!("TLS handshake with {} failed: {}", service, e))
            })?;
            self.exchange(tls_stream, request).await
        } else {
            self.exchange(stream, request).await
        }
    }

    async fn exchange<S>(&self, mut stream: S, request: &[u8]) -> CoreResult<Vec<u8>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        stream.write_all(request).await?;
        stream.flush().await?;

        let mut response = Vec::new();
        let mut chunk = [0u8; 4096];
        let deadline = Instant::now() + self.read_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let read = tokio::time::timeout(remaining, stream.read(&mut chunk))
                .await
                .map_err(|_| incomplete(&response, "read timed out"))?;

            match read {
                Ok(0) => break,
                Ok(n) => {
                    response.extend_from_slice(&chunk[..n]);
                    if response.len() > self.max_response_size {
                        return Err(incomplete(
                            &response,
                            &format!("exceeds {} bytes", self.max_response_size),
                        ));
                    }
                    if response_complete(&response) {
                        trace!("Received {} bytes", response.len());
                        return Ok(response);
                    }
                }
                Err(e) if response.is_empty() => return Err(e.into()),
                Err(e) => {
                    // TLS peers often close without close_notify once the body is sent
                    debug!("Read ended with error after {} bytes: {}", response.len(), e);
                    break;
                }
            }
        }

        if response.is_empty() || response_framing(&response) == ResponseFraming::UntilClose {
            trace!("Received {} bytes before close", response.len());
            Ok(response)
        } else {
            Err(incomplete(&response, "connection closed"))
        }
    }
}

fn incomplete(response: &[u8], reason: &str) -> ProbeError {
    ProbeError::Response(format!(
        "incomplete response: {} after {} bytes",
        reason,
        response.len()
    ))
}

impl Transport for RawTransport {
    fn send<'a>(
        &'a self,
        service: &'a HttpService,
        request: &'a [u8],
    ) -> BoxFuture<'a, CoreResult<Vec<u8>>> {
        self.send_raw(service, request).boxed()
    }
}

/// Replays the request through reqwest, which allows an upstream proxy.
///
/// The request is re-parsed and rebuilt, so framing headers are regenerated
/// and the response is reassembled into HTTP/1.x text.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ConfigParameter) -> CoreResult<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout()))
            .timeout(Duration::from_secs(config.timeout()))
            .redirect(reqwest::redirect::Policy::none());

        if let Some(proxy) = config.proxy() {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(ReqwestTransport {
            client: builder.build()?,
        })
    }

    async fn send_rebuilt(&self, service: &HttpService, request: &[u8]) -> CoreResult<Vec<u8>> {
        let parsed = HttpRequest::parse(request)?;
        let method = reqwest::Method::from_bytes(parsed.method().as_bytes())
            .map_err(|e| ProbeError::Parse(format!("invalid method: {}", e)))?;
        let url = service.url_for(parsed.target())?;

        let mut builder = self.client.request(method, url);
        for header in parsed.headers() {
            let name = header.name().trim();
            if REBUILT_HEADERS
                .iter()
                .any(|skipped| name.eq_ignore_ascii_case(skipped))
            {
                continue;
            }
            builder = builder.header(name, header.value_bytes());
        }
        if !parsed.body().is_empty() {
            builder = builder.body(parsed.body().to_vec());
        }

        let response = builder.send().await?;
        let mut raw = format!("{:?} {}\r\n", response.version(), response.status()).into_bytes();
        for (name, value) in response.headers() {
            raw.extend_from_slice(name.as_str().as_bytes());
            raw.extend_from_slice(b": ");
            raw.extend_from_slice(value.as_bytes());
            raw.extend_from_slice(b"\r\n");
        }
        raw.extend_from_slice(b"\r\n");
        raw.extend_from_slice(&response.bytes().await?);
        Ok(raw)
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        service: &'a HttpService,
        request: &'a [u8],
    ) -> BoxFuture<'a, CoreResult<Vec<u8>>> {
        self.send_rebuilt(service, request).boxed()
    }
}
