/*
Copyright 2022 Volker Schwaberow <volker@schwaberow.de>
Permission is hereby granted, free of charge, to any person obtaining a
copy of this software and associated documentation files (the
"Software"), to deal in the Software without restriction, including without
limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the
Software is furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be
included in all copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT
SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR
OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE,
ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
DEALINGS IN THE SOFTWARE.
Author(s): Volker Schwaberow
*/

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GetState {
    total_cookies: usize,
    dispatched: usize,
    session_ended: usize,
    session_active: usize,
    failed: usize,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl GetState {
    pub fn new() -> GetState {
        GetState::default()
    }

    pub fn start(&mut self) {
        self.start_time = Some(Utc::now());
    }

    pub fn finish(&mut self) {
        self.end_time = Some(Utc::now());
    }

    pub fn set_total_cookies(&mut self, total_cookies: usize) {
        self.total_cookies = total_cookies;
    }

    pub fn total_cookies(&self) -> usize {
        self.total_cookies
    }

    pub fn add_dispatch(&mut self) {
        self.dispatched += 1;
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    pub fn add_session_ended(&mut self) {
        self.session_ended += 1;
    }

    pub fn session_ended(&self) -> usize {
        self.session_ended
    }

    pub fn add_session_active(&mut self) {
        self.session_active += 1;
    }

    pub fn session_active(&self) -> usize {
        self.session_active
    }

    pub fn add_failure(&mut self) {
        self.failed += 1;
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn elapsed_ms(&self) -> i64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => (end - start).num_milliseconds(),
            _ => 0,
        }
    }
}
