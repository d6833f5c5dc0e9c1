// File: reporter.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::request::Cookie;
use log::debug;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Progress sink for a probe run. Calls arrive from the worker task and
/// must return quickly.
pub trait Reporter: Send + Sync {
    fn set_current_test(&self, label: &str);
    fn set_cookies(&self, candidates: &[Cookie]);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEvent {
    CurrentTest(String),
    Cookies(Vec<Cookie>),
}

/// Forwards updates over a channel so the display side owns its own context.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: UnboundedSender<ProbeEvent>,
}

impl ChannelReporter {
    pub fn new() -> (Self, UnboundedReceiver<ProbeEvent>) {
        let (sender, receiver) = unbounded_channel();
        (ChannelReporter { sender }, receiver)
    }

    fn publish(&self, event: ProbeEvent) {
        if self.sender.send(event).is_err() {
            debug!("Reporter receiver dropped; discarding update");
        }
    }
}

impl Reporter for ChannelReporter {
    fn set_current_test(&self, label: &str) {
        self.publish(ProbeEvent::CurrentTest(label.to_string()));
    }

    fn set_cookies(&self, candidates: &[Cookie]) {
        self.publish(ProbeEvent::Cookies(candidates.to_vec()));
    }
}
