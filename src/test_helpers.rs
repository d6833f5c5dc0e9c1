// File: test_helpers.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::ConfigParameter;
use crate::engine::{BaseTransaction, ProbeEngine};
use crate::errors::{CoreResult, ProbeError};
use crate::http::Transport;
use crate::reporter::{ProbeEvent, Reporter};
use crate::request::{Cookie, HttpRequest};
use crate::service::HttpService;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&HttpRequest) -> CoreResult<Vec<u8>> + Send + Sync;

/// Answers each request with the result of a closure and keeps every
/// request it was handed.
pub struct ScriptedTransport {
    responder: Box<Responder>,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> CoreResult<Vec<u8>> + Send + Sync + 'static,
    {
        Arc::new(ScriptedTransport {
            responder: Box::new(responder),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Page that greets the user only while every cookie in `required` is sent.
    pub fn requiring(required: &'static [&'static str], marker: &'static str) -> Arc<Self> {
        Self::new(move |request| {
            let names: Vec<&str> = request.cookies().iter().map(|c| c.name.as_str()).collect();
            if required.iter().all(|r| names.contains(r)) {
                Ok(html_response(&format!("<h1>{}, alice</h1>", marker)))
            } else {
                Ok(html_response("<h1>Please log in</h1>"))
            }
        })
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_cookie_names(&self) -> Vec<Vec<String>> {
        self.sent()
            .iter()
            .map(|raw| {
                HttpRequest::parse(raw)
                    .unwrap()
                    .cookies()
                    .iter()
                    .map(|c| c.name.clone())
                    .collect()
            })
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        _service: &'a HttpService,
        request: &'a [u8],
    ) -> BoxFuture<'a, CoreResult<Vec<u8>>> {
        async move {
            self.sent.lock().unwrap().push(request.to_vec());
            let parsed = HttpRequest::parse(request)
                .map_err(|e| ProbeError::Transport(format!("bad request on wire: {}", e)))?;
            (self.responder)(&parsed)
        }
        .boxed()
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProbeEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingReporter::default())
    }

    pub fn events(&self) -> Vec<ProbeEvent> {
        self.events.lock().unwrap().clone()
    }
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

pub fn html_response(body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
    .into_bytes()
}

pub fn base_transaction(cookie_header: Option<&str>) -> BaseTransaction {
    let mut raw = String::from("GET /account HTTP/1.1\r\nHost: shop.example.com\r\n");
    if let Some(cookies) = cookie_header {
        raw.push_str(&format!("Cookie: {}\r\n", cookies));
    }
    raw.push_str("Accept: text/html\r\n\r\n");
    BaseTransaction::new(
        HttpService::new("shop.example.com", 80, false),
        raw.into_bytes(),
    )
}

pub fn unlimited_engine(transport: Arc<dyn Transport>) -> ProbeEngine {
    let mut config = ConfigParameter::new();
    config.set_rate_limit(0);
    ProbeEngine::new(transport, &config)
}
