// File: service.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::errors::{CoreResult, ProbeError};
use crate::request::HttpRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpService {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

impl HttpService {
    pub fn new(host: &str, port: u16, secure: bool) -> Self {
        HttpService {
            host: host.to_string(),
            port,
            secure,
        }
    }

    pub fn from_url(url: &str) -> CoreResult<Self> {
        let parsed = Url::parse(url)?;
        let secure = match parsed.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(ProbeError::Configuration(format!(
                    "unsupported scheme: {}",
                    other
                )))
            }
        };
        let host = parsed
            .host_str()
            .ok_or_else(|| ProbeError::Configuration(format!("no host in {}", url)))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let port = parsed
            .port_or_known_default()
            .unwrap_or(if secure { 443 } else { 80 });
        Ok(HttpService::new(host, port, secure))
    }

    /// Derives the target from the request's `Host` header.
    pub fn from_request(request: &HttpRequest, secure: bool) -> CoreResult<Self> {
        let host_header = request.host().ok_or_else(|| {
            ProbeError::Configuration("request has no Host header; use --target".to_string())
        })?;
        let scheme = if secure { "https" } else { "http" };
        Self::from_url(&format!("{}://{}/", scheme, host_header))
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    pub fn authority(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("{}:{}", host, self.port)
    }

    /// Absolute URL for a request target; absolute-form targets pass through.
    pub fn url_for(&self, target: &str) -> CoreResult<Url> {
        if target.starts_with("http://") || target.starts_with("https://") {
            return Ok(Url::parse(target)?);
        }
        let base = Url::parse(&self.to_string())?;
        Ok(base.join(target)?)
    }
}

impl fmt::Display for HttpService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme(), self.authority())
    }
}
