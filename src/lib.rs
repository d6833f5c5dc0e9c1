// File: lib.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::new_without_default)]
#![allow(clippy::bool_assert_comparison)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod getstate;
pub mod http;
pub mod httpinner;
pub mod launch;
pub mod report;
pub mod reporter;
pub mod request;
pub mod service;

#[cfg(test)]
mod request_tests;
#[cfg(test)]
mod test_helpers;
