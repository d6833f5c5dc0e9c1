// File: engine.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::ConfigParameter;
use crate::errors::{CoreResult, ProbeError};
use crate::getstate::GetState;
use crate::http::Transport;
use crate::httpinner::HttpInner;
use crate::reporter::Reporter;
use crate::request::{Cookie, HttpRequest};
use crate::service::HttpService;
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use log::{debug, error, info, trace, warn};
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

pub const DONE_LABEL: &str = "DONE";

/// The captured transaction every probe is derived from.
#[derive(Debug, Clone)]
pub struct BaseTransaction {
    pub service: HttpService,
    pub request: Vec<u8>,
    pub response: Option<Vec<u8>>,
}

impl BaseTransaction {
    pub fn new(service: HttpService, request: Vec<u8>) -> Self {
        BaseTransaction {
            service,
            request,
            response: None,
        }
    }

    pub fn with_response(mut self, response: Vec<u8>) -> Self {
        self.response = Some(response);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeState {
    Idle,
    Running,
    Done,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IterationOutcome {
    SessionActive,
    SessionEnded,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeIteration {
    pub index: usize,
    pub cookie: Cookie,
    pub outcome: IterationOutcome,
    pub status: Option<u16>,
    pub elapsed_ms: u64,
    pub response_sha256: Option<String>,
}

impl ProbeIteration {
    pub fn is_session_cookie(&self) -> bool {
        self.outcome == IterationOutcome::SessionEnded
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub state: ProbeState,
    pub current_test: String,
    pub match_string: String,
    pub candidates: Vec<Cookie>,
    pub iterations: Vec<ProbeIteration>,
    pub stats: GetState,
}

impl ProbeResult {
    pub fn new(match_string: &str) -> Self {
        ProbeResult {
            state: ProbeState::Idle,
            current_test: String::new(),
            match_string: match_string.to_string(),
            candidates: Vec::new(),
            iterations: Vec::new(),
            stats: GetState::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, ProbeState::Done | ProbeState::Aborted)
    }
}

/// A response without the active-session marker means the session ended.
pub fn session_ended(response: &HttpInner, match_string: &str) -> bool {
    !response.contains(match_string)
}

/// `cookies` minus the entry at `index`, other entries in original order.
pub fn without(cookies: &[Cookie], index: usize) -> Vec<Cookie> {
    cookies
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, c)| c.clone())
        .collect()
}

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct ProbeEngine {
    transport: Arc<dyn Transport>,
    rate_limiter: Option<Arc<DirectLimiter>>,
}

impl ProbeEngine {
    pub fn new(transport: Arc<dyn Transport>, config: &ConfigParameter) -> Self {
        let rate_limiter = NonZeroU32::new(config.rate_limit())
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));
        ProbeEngine {
            transport,
            rate_limiter,
        }
    }

    /// Replays the base request once per cookie, each time without that
    /// cookie, strictly in cookie order with one request in flight.
    pub async fn run(
        &self,
        base: &BaseTransaction,
        match_string: &str,
        reporter: &dyn Reporter,
    ) -> ProbeResult {
        let mut result = ProbeResult::new(match_string);
        result.state = ProbeState::Running;
        result.stats.start();
        info!("Starting session discovery against {}", base.service);

        let request = match HttpRequest::parse(&base.request) {
            Ok(request) => request,
            Err(e) => {
                error!("Cannot parse base request: {}", e);
                result.state = ProbeState::Aborted;
                result.stats.finish();
                return result;
            }
        };
        debug!("Original request:\n{}", request);

        let original = request.cookies().to_vec();
        result.stats.set_total_cookies(original.len());
        info!("Testing {} cookies...", original.len());

        for (index, cookie) in original.iter().enumerate() {
            debug!("Test #{}: removing cookie {}", index, cookie.name);
            result.current_test = cookie.name.clone();
            reporter.set_current_test(&cookie.name);

            let variant = request.with_cookies(&without(&original, index)).to_bytes();
            let iteration = self
                .probe(index, cookie, &base.service, &variant, match_string, &mut result.stats)
                .await;

            if iteration.is_session_cookie() {
                info!("Session cookie found: {}", cookie.name);
                result.candidates.push(cookie.clone());
                reporter.set_cookies(&result.candidates);
            }
            result.iterations.push(iteration);
        }

        result.current_test = DONE_LABEL.to_string();
        result.state = ProbeState::Done;
        result.stats.finish();
        reporter.set_current_test(DONE_LABEL);
        reporter.set_cookies(&result.candidates);

        info!(
            "Session discovery finished: {} of {} cookies carry the session, {} failed",
            result.candidates.len(),
            original.len(),
            result.stats.failed()
        );
        result
    }

    async fn probe(
        &self,
        index: usize,
        cookie: &Cookie,
        service: &HttpService,
        variant: &[u8],
        match_string: &str,
        stats: &mut GetState,
    ) -> ProbeIteration {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let started = Instant::now();
        stats.add_dispatch();
        let dispatched = self.dispatch(service, variant).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match dispatched {
            Ok(response) => {
                let outcome = if session_ended(&response, match_string) {
                    stats.add_session_ended();
                    IterationOutcome::SessionEnded
                } else {
                    stats.add_session_active();
                    IterationOutcome::SessionActive
                };
                ProbeIteration {
                    index,
                    cookie: cookie.clone(),
                    outcome,
                    status: response.status(),
                    elapsed_ms,
                    response_sha256: Some(response.sha256()),
                }
            }
            Err(e) => {
                if e.is_fatal() {
                    error!("Test #{} ({}) cannot be sent: {}", index, cookie.name, e);
                } else {
                    warn!("Test #{} ({}) failed: {}", index, cookie.name, e);
                }
                stats.add_failure();
                ProbeIteration {
                    index,
                    cookie: cookie.clone(),
                    outcome: IterationOutcome::Failed {
                        reason: e.to_string(),
                    },
                    status: None,
                    elapsed_ms,
                    response_sha256: None,
                }
            }
        }
    }

    async fn dispatch(&self, service: &HttpService, variant: &[u8]) -> CoreResult<HttpInner> {
        let raw = self.transport.send(service, variant).await?;
        if raw.is_empty() {
            return Err(ProbeError::Response("empty response".to_string()));
        }
        let response = HttpInner::from_raw(raw);
        trace!("Response:\n{}", response.text());
        Ok(response)
    }
}
