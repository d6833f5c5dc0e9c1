// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Raw,
    Reqwest,
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(TransportKind::Raw),
            "reqwest" => Ok(TransportKind::Reqwest),
            other => Err(format!("unknown transport: {}", other)),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Raw => write!(f, "raw"),
            TransportKind::Reqwest => write!(f, "reqwest"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigParameter {
    timeout: u64,
    rate_limit: u32,
    transport: TransportKind,
    proxy: Option<String>,
    max_response_size: usize,
    secure: bool,
    no_color: bool,
}

impl Default for ConfigParameter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParameter {
    pub fn new() -> Self {
        Self {
            timeout: 10,
            rate_limit: 10,
            transport: TransportKind::Raw,
            proxy: None,
            max_response_size: 1024 * 1024,
            secure: false,
            no_color: false,
        }
    }

    pub fn set_timeout(&mut self, timeout: u64) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    /// Requests per second; zero disables the limiter.
    pub fn set_rate_limit(&mut self, rate_limit: u32) {
        self.rate_limit = rate_limit;
    }

    pub fn rate_limit(&self) -> u32 {
        self.rate_limit
    }

    pub fn set_transport(&mut self, transport: TransportKind) {
        self.transport = transport;
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    pub fn set_proxy(&mut self, proxy: Option<String>) {
        self.proxy = proxy;
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn set_max_response_size(&mut self, max_response_size: usize) {
        self.max_response_size = max_response_size;
    }

    pub fn max_response_size(&self) -> usize {
        self.max_response_size
    }

    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn set_no_color(&mut self, no_color: bool) {
        self.no_color = no_color;
    }

    pub fn no_color(&self) -> bool {
        self.no_color
    }
}
