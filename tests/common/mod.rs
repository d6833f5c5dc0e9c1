// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(dead_code)]

use sessprobe::reporter::{ProbeEvent, Reporter};
use sessprobe::request::{Cookie, HttpRequest};
use sessprobe::service::HttpService;
use std::sync::Mutex;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const MARKER: &str = "Welcome back";

/// Account page that only greets requests still carrying `sid=abc`.
pub async fn setup_session_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .and(header_regex("cookie", r"(^|;\s*)sid=abc(;|$)"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("<h1>{}, alice</h1>", MARKER))
                .append_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(302)
                .append_header("location", "/login")
                .set_body_string("Please log in"),
        )
        .with_priority(10)
        .mount(&server)
        .await;

    server
}

pub fn service_for(server: &MockServer) -> HttpService {
    HttpService::from_url(&server.uri()).unwrap()
}

pub fn raw_request(server: &MockServer, cookies: Option<&str>) -> Vec<u8> {
    let mut raw = format!(
        "GET /account HTTP/1.1\r\nHost: {}\r\nUser-Agent: sessprobe-test\r\n",
        server.address()
    );
    if let Some(cookies) = cookies {
        raw.push_str(&format!("Cookie: {}\r\n", cookies));
    }
    raw.push_str("Accept: text/html\r\n\r\n");
    raw.into_bytes()
}

pub fn cookie_header(request: &Request) -> Option<String> {
    request
        .headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

pub fn cookie_names(raw: &[u8]) -> Vec<String> {
    HttpRequest::parse(raw)
        .unwrap()
        .cookies()
        .iter()
        .map(|c| c.name.clone())
        .collect()
}

#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<ProbeEvent>>,
}

impl Reporter for RecordingReporter {
    fn set_current_test(&self, label: &str) {
        self.events
            .lock()
            .unwrap()
            .push(ProbeEvent::CurrentTest(label.to_string()));
    }

    fn set_cookies(&self, candidates: &[Cookie]) {
        self.events
            .lock()
            .unwrap()
            .push(ProbeEvent::Cookies(candidates.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_setup() {
        let server = setup_session_server().await;
        assert!(!server.uri().is_empty());
        assert_eq!(service_for(&server).host, "127.0.0.1");
    }

    #[tokio::test]
    async fn test_raw_request_parses() {
        let server = setup_session_server().await;
        let raw = raw_request(&server, Some("sid=abc; theme=dark"));
        assert_eq!(cookie_names(&raw), vec!["sid", "theme"]);
    }
}
