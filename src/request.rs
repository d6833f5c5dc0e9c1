// File: request.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::errors::{CoreResult, ProbeError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

static REQUEST_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([!#$%&'*+.^_`|~0-9A-Za-z-]+) (\S+)(?: (\S+))?$").unwrap()
});

const COOKIE_HEADER: &str = "Cookie";
const COOKIE_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub position: usize,
    #[serde(skip_serializing_if = "is_false")]
    bare: bool,
    /// The pair as sent, so bytes outside UTF-8 survive a rewrite.
    #[serde(skip)]
    raw: Vec<u8>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn trim_bytes(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if !first.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }
    while let [rest @ .., last] = bytes {
        if !last.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }
    bytes
}

impl Cookie {
    pub fn new(name: &str, value: &str, position: usize) -> Self {
        Cookie {
            name: name.to_string(),
            value: value.to_string(),
            position,
            bare: false,
            raw: format!("{}={}", name, value).into_bytes(),
        }
    }

    /// A pair that was sent without `=`; it is written back the same way.
    pub fn bare(name: &str, position: usize) -> Self {
        Cookie {
            name: name.to_string(),
            value: String::new(),
            position,
            bare: true,
            raw: name.as_bytes().to_vec(),
        }
    }

    fn from_pair(pair: &[u8], position: usize) -> Self {
        match pair.iter().position(|&b| b == b'=') {
            Some(eq) => {
                let name = trim_bytes(&pair[..eq]);
                let value = trim_bytes(&pair[eq + 1..]);
                let mut raw = Vec::with_capacity(name.len() + value.len() + 1);
                raw.extend_from_slice(name);
                raw.push(b'=');
                raw.extend_from_slice(value);
                Cookie {
                    name: String::from_utf8_lossy(name).to_string(),
                    value: String::from_utf8_lossy(value).to_string(),
                    position,
                    bare: false,
                    raw,
                }
            }
            None => Cookie {
                name: String::from_utf8_lossy(pair).to_string(),
                value: String::new(),
                position,
                bare: true,
                raw: pair.to_vec(),
            },
        }
    }

    pub fn is_bare(&self) -> bool {
        self.bare
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Splits a `Cookie` header value on `;`, numbering pairs from `first_position`.
    pub fn parse_list(header_value: impl AsRef<[u8]>, first_position: usize) -> Vec<Cookie> {
        header_value
            .as_ref()
            .split(|&b| b == b';')
            .map(trim_bytes)
            .filter(|pair| !pair.is_empty())
            .enumerate()
            .map(|(i, pair)| Cookie::from_pair(pair, first_position + i))
            .collect()
    }

    pub fn join(cookies: &[Cookie]) -> Vec<u8> {
        cookies
            .iter()
            .map(Cookie::as_bytes)
            .collect::<Vec<_>>()
            .join(COOKIE_SEPARATOR.as_bytes())
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bare {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}={}", self.name, self.value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: String,
    value_bytes: Vec<u8>,
    raw: Vec<u8>,
}

impl Header {
    fn new(name: &str, value: &[u8], eol: &str) -> Self {
        let mut raw = format!("{}: ", name).into_bytes();
        raw.extend_from_slice(value);
        raw.extend_from_slice(eol.as_bytes());
        Header {
            name: name.to_string(),
            value: String::from_utf8_lossy(value).to_string(),
            value_bytes: value.to_vec(),
            raw,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn value_bytes(&self) -> &[u8] {
        &self.value_bytes
    }

    pub fn is_cookie(&self) -> bool {
        self.name.trim().eq_ignore_ascii_case(COOKIE_HEADER)
    }

    fn fold(&mut self, line: &[u8], content: &[u8]) {
        let continuation = trim_bytes(content);
        if !continuation.is_empty() {
            if !self.value_bytes.is_empty() {
                self.value_bytes.push(b' ');
            }
            self.value_bytes.extend_from_slice(continuation);
            self.value = String::from_utf8_lossy(&self.value_bytes).to_string();
        }
        self.raw.extend_from_slice(line);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: String,
    target: String,
    version: Option<String>,
    request_line: Vec<u8>,
    headers: Vec<Header>,
    blank_line: Vec<u8>,
    body: Vec<u8>,
    cookies: Vec<Cookie>,
    eol: &'static str,
}

fn strip_eol(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

impl HttpRequest {
    pub fn parse(raw: &[u8]) -> CoreResult<Self> {
        let mut lines: Vec<&[u8]> = Vec::new();
        let mut offset = 0;

        let blank_line = loop {
            let rest = &raw[offset..];
            let newline = rest
                .iter()
                .position(|&b| b == b'\n')
                .ok_or_else(|| ProbeError::Parse("unterminated header block".to_string()))?;
            let line = &rest[..=newline];
            offset += newline + 1;

            if strip_eol(line).is_empty() {
                if lines.is_empty() {
                    return Err(ProbeError::Parse("missing request line".to_string()));
                }
                break line.to_vec();
            }
            lines.push(line);
        };

        let request_line = lines[0];
        let eol = if request_line.ends_with(b"\r\n") {
            "\r\n"
        } else {
            "\n"
        };
        let line_text = std::str::from_utf8(strip_eol(request_line))
            .map_err(|_| ProbeError::Parse("request line is not valid UTF-8".to_string()))?;
        let captures = REQUEST_LINE.captures(line_text).ok_or_else(|| {
            ProbeError::Parse(format!("malformed request line: {:?}", line_text))
        })?;
        let method = captures[1].to_string();
        let target = captures[2].to_string();
        let version = captures.get(3).map(|m| m.as_str().to_string());

        let mut headers: Vec<Header> = Vec::new();
        for line in &lines[1..] {
            let content = strip_eol(line);
            if content.starts_with(b" ") || content.starts_with(b"\t") {
                let previous = headers.last_mut().ok_or_else(|| {
                    ProbeError::Parse("continuation line before first header".to_string())
                })?;
                previous.fold(line, content);
                continue;
            }

            let colon = content.iter().position(|&b| b == b':').ok_or_else(|| {
                ProbeError::Parse(format!(
                    "malformed header line: {:?}",
                    String::from_utf8_lossy(content)
                ))
            })?;
            let name = String::from_utf8_lossy(&content[..colon]).to_string();
            if name.trim().is_empty() {
                return Err(ProbeError::Parse("header with empty name".to_string()));
            }
            let value_bytes = trim_bytes(&content[colon + 1..]).to_vec();
            headers.push(Header {
                name,
                value: String::from_utf8_lossy(&value_bytes).to_string(),
                value_bytes,
                raw: line.to_vec(),
            });
        }

        let mut request = HttpRequest {
            method,
            target,
            version,
            request_line: request_line.to_vec(),
            headers,
            blank_line,
            body: raw[offset..].to_vec(),
            cookies: Vec::new(),
            eol,
        };
        request.cookies = request.collect_cookies();
        Ok(request)
    }

    fn collect_cookies(&self) -> Vec<Cookie> {
        let mut cookies = Vec::new();
        for header in self.headers.iter().filter(|h| h.is_cookie()) {
            let parsed = Cookie::parse_list(header.value_bytes(), cookies.len());
            cookies.extend(parsed);
        }
        cookies
    }

    /// Replaces every `Cookie` header with a single one built from `cookies`.
    ///
    /// The rebuilt header takes the place of the first original `Cookie`
    /// header, or is appended after the last header when there was none. An
    /// empty list removes the header entirely.
    pub fn set_cookies(&mut self, cookies: &[Cookie]) {
        let existing = self.headers.iter().position(Header::is_cookie);
        let header_name = existing
            .map(|i| self.headers[i].name().trim().to_string())
            .unwrap_or_else(|| COOKIE_HEADER.to_string());

        self.headers.retain(|h| !h.is_cookie());
        let insert_at = existing.unwrap_or(self.headers.len());

        if !cookies.is_empty() {
            let header = Header::new(&header_name, &Cookie::join(cookies), self.eol);
            self.headers.insert(insert_at, header);
        }

        self.cookies = cookies
            .iter()
            .enumerate()
            .map(|(position, c)| Cookie {
                position,
                ..c.clone()
            })
            .collect();
    }

    pub fn with_cookies(&self, cookies: &[Cookie]) -> HttpRequest {
        let mut request = self.clone();
        request.set_cookies(cookies);
        request
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.request_line.len()
                + self.headers.iter().map(|h| h.raw.len()).sum::<usize>()
                + self.blank_line.len()
                + self.body.len(),
        );
        out.extend_from_slice(&self.request_line);
        for header in &self.headers {
            out.extend_from_slice(&header.raw);
        }
        out.extend_from_slice(&self.blank_line);
        out.extend_from_slice(&self.body);
        out
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name().trim().eq_ignore_ascii_case(name))
            .map(Header::value)
    }

    pub fn host(&self) -> Option<&str> {
        self.header("host")
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.to_bytes()))
    }
}
