// File: httpinner.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use sha2::{Digest, Sha256};

/// Loose view over a raw response as it came off the wire.
#[derive(Debug, Clone)]
pub struct HttpInner {
    raw: Vec<u8>,
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body_offset: usize,
}

fn find_header_end(raw: &[u8]) -> Option<(usize, usize)> {
    if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
        return Some((pos, pos + 4));
    }
    raw.windows(2)
        .position(|w| w == b"\n\n")
        .map(|pos| (pos, pos + 2))
}

impl HttpInner {
    pub fn new() -> Self {
        HttpInner {
            raw: Vec::new(),
            status: None,
            headers: Vec::new(),
            body_offset: 0,
        }
    }

    pub fn from_raw(raw: Vec<u8>) -> Self {
        let (head_end, body_offset) = find_header_end(&raw).unwrap_or((raw.len(), raw.len()));
        let head = String::from_utf8_lossy(&raw[..head_end]).to_string();
        let mut lines = head.lines();

        let status = lines.next().and_then(|status_line| {
            let mut parts = status_line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(version), Some(code)) if version.starts_with("HTTP/") => code.parse().ok(),
                _ => None,
            }
        });

        let headers = lines
            .filter_map(|line| {
                line.split_once(':')
                    .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
            })
            .collect();

        HttpInner {
            raw,
            status,
            headers,
            body_offset,
        }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.raw[self.body_offset.min(self.raw.len())..]
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw).to_string()
    }

    /// Literal, case-sensitive search over the whole response as text.
    pub fn contains(&self, needle: &str) -> bool {
        self.text().contains(needle)
    }

    pub fn sha256(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.raw);
        format!("{:x}", hasher.finalize())
    }

    /// Text of the byte range `[start, end)`, used to suggest a match string
    /// from a highlighted part of the base response.
    pub fn selection(&self, start: usize, end: usize) -> Option<String> {
        if start >= end || end > self.raw.len() {
            return None;
        }
        let selected = String::from_utf8_lossy(&self.raw[start..end]).to_string();
        if selected.trim().is_empty() {
            None
        } else {
            Some(selected)
        }
    }
}

/// How far a buffered response is along, judged by its framing headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFraming {
    Complete,
    Partial,
    /// No length framing; the message ends when the peer closes.
    UntilClose,
}

pub fn response_framing(buf: &[u8]) -> ResponseFraming {
    let Some((_, body_offset)) = find_header_end(buf) else {
        return ResponseFraming::Partial;
    };
    let inner = HttpInner::from_raw(buf.to_vec());

    if let Some(status) = inner.status() {
        if (100..200).contains(&status) || status == 204 || status == 304 {
            return ResponseFraming::Complete;
        }
    }

    let body = &buf[body_offset..];
    if inner
        .header("transfer-encoding")
        .map(|v| v.to_lowercase().contains("chunked"))
        .unwrap_or(false)
    {
        return if chunked_complete(body) {
            ResponseFraming::Complete
        } else {
            ResponseFraming::Partial
        };
    }

    match inner.header("content-length") {
        Some(value) => match value.parse::<usize>() {
            Ok(length) if body.len() >= length => ResponseFraming::Complete,
            _ => ResponseFraming::Partial,
        },
        None => ResponseFraming::UntilClose,
    }
}

pub fn response_complete(buf: &[u8]) -> bool {
    response_framing(buf) == ResponseFraming::Complete
}

fn take_line(buf: &[u8]) -> Option<(&[u8], &[u8])> {
    let eol = buf.iter().position(|&b| b == b'\n')?;
    let line = &buf[..eol];
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    Some((line, &buf[eol + 1..]))
}

/// Walks chunk sizes so data that merely ends in `0\r\n\r\n` is not
/// mistaken for the last chunk. Trailer fields after the last chunk are
/// skipped up to the closing empty line.
fn chunked_complete(body: &[u8]) -> bool {
    let mut rest = body;
    loop {
        let Some((size_line, after)) = take_line(rest) else {
            return false;
        };
        let size_text = String::from_utf8_lossy(size_line);
        let size_text = size_text.split(';').next().unwrap_or_default().trim();
        let Ok(size) = usize::from_str_radix(size_text, 16) else {
            return false;
        };
        rest = after;

        if size == 0 {
            while let Some((trailer, after)) = take_line(rest) {
                if trailer.is_empty() {
                    return true;
                }
                rest = after;
            }
            return false;
        }

        if rest.len() < size {
            return false;
        }
        match take_line(&rest[size..]) {
            Some((terminator, after)) if terminator.is_empty() => rest = after,
            _ => return false,
        }
    }
}
