// File: errors.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::fmt;

#[derive(Debug)]
pub enum ProbeError {
    Input(String),
    Parse(String),
    Transport(String),
    Response(String),
    Io(std::io::Error),
    Configuration(String),
}

impl ProbeError {
    /// Input and parse failures stop a run before any cookie is tested.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Parse(_))
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(msg) => write!(f, "Input error: {}", msg),
            Self::Parse(msg) => write!(f, "Parse error: {}", msg),
            Self::Transport(msg) => write!(f, "Transport error: {}", msg),
            Self::Response(msg) => write!(f, "Unexpected response: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Configuration(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<url::ParseError> for ProbeError {
    fn from(error: url::ParseError) -> Self {
        Self::Configuration(format!("invalid URL: {}", error))
    }
}

pub type CoreResult<T> = Result<T, ProbeError>;
