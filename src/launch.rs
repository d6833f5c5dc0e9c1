// File: launch.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::engine::{BaseTransaction, ProbeEngine, ProbeResult};
use crate::errors::{CoreResult, ProbeError};
use crate::httpinner::HttpInner;
use crate::reporter::Reporter;
use crate::request::HttpRequest;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub fn ensure_single(transactions: &[BaseTransaction]) -> CoreResult<&BaseTransaction> {
    match transactions {
        [single] => Ok(single),
        [] => Err(ProbeError::Input("no base request supplied".to_string())),
        many => Err(ProbeError::Input(format!(
            "session discovery only works with one request at a time, got {}",
            many.len()
        ))),
    }
}

/// Checks the preconditions and starts the run on its own task.
///
/// Refusals are logged and returned before any request goes out; the
/// reporter is not touched in that case.
pub fn launch(
    transactions: Vec<BaseTransaction>,
    match_string: &str,
    engine: Arc<ProbeEngine>,
    reporter: Arc<dyn Reporter>,
) -> CoreResult<JoinHandle<ProbeResult>> {
    info!("Launching scan with {} request(s)", transactions.len());

    let base = match ensure_single(&transactions) {
        Ok(base) => base.clone(),
        Err(e) => {
            error!("{} - exiting", e);
            return Err(e);
        }
    };

    if match_string.is_empty() {
        let e = ProbeError::Input("match string must not be empty".to_string());
        error!("{} - exiting", e);
        return Err(e);
    }

    warn_on_baseline(&base, match_string);

    let match_string = match_string.to_string();
    Ok(tokio::spawn(async move {
        engine.run(&base, &match_string, reporter.as_ref()).await
    }))
}

fn warn_on_baseline(base: &BaseTransaction, match_string: &str) {
    if let Some(response) = &base.response {
        if !HttpInner::from_raw(response.clone()).contains(match_string) {
            warn!(
                "Base response does not contain {:?}; every cookie is likely to be flagged",
                match_string
            );
        }
    }

    if let Ok(request) = HttpRequest::parse(&base.request) {
        if let Some(encoding) = request.header("accept-encoding") {
            if !encoding.eq_ignore_ascii_case("identity") {
                warn!(
                    "Base request accepts encoded responses ({}); the match string is searched in the raw bytes",
                    encoding
                );
            }
        }
    }
}
