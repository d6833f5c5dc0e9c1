// File: cli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

use crate::config::{ConfigParameter, TransportKind};
use crate::report::ReportFormat;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[arg(
        short = 'r',
        long = "request",
        required = true,
        help = "Raw captured HTTP request (only one per run is probed)"
    )]
    pub requests: Vec<PathBuf>,

    #[arg(long = "target", help = "Target service URL, defaults to the Host header")]
    pub target: Option<String>,

    #[arg(
        short = 'm',
        long = "match",
        help = "Text present in responses while the session is active"
    )]
    pub match_string: Option<String>,

    #[arg(long = "response", help = "Saved base response")]
    pub response: Option<PathBuf>,

    #[arg(
        long = "selection",
        requires = "response",
        help = "Byte range START:END of the base response to use as match string"
    )]
    pub selection: Option<String>,

    #[arg(long = "secure", help = "Use https when the target comes from the Host header")]
    pub secure: bool,

    #[arg(
        short = 't',
        long = "timeout",
        default_value_t = 10,
        help = "HTTP request timeout in seconds"
    )]
    pub timeout: u64,

    #[arg(
        long = "rate-limit",
        default_value_t = 10,
        help = "Requests per second, 0 for unlimited"
    )]
    pub rate_limit: u32,

    #[arg(long = "transport", default_value = "raw", value_parser = parse_transport)]
    pub transport: TransportKind,

    #[arg(long = "proxy", help = "Upstream proxy (reqwest transport only)")]
    pub proxy: Option<String>,

    #[arg(long = "max-response-size", default_value_t = 1024 * 1024)]
    pub max_response_size: usize,

    #[arg(short = 'f', long = "format", default_value = "text", value_parser = parse_format)]
    pub format: ReportFormat,

    #[arg(short = 'o', long = "output", help = "Write a report of the run")]
    pub output: Option<PathBuf>,

    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,

    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short = 'q', long = "quiet", help = "Reduce output verbosity")]
    pub quiet: bool,

    #[arg(long = "no-color", help = "Disable colored output")]
    pub no_color: bool,
}

fn parse_transport(s: &str) -> Result<TransportKind, String> {
    s.parse()
}

fn parse_format(s: &str) -> Result<ReportFormat, String> {
    s.parse()
}

impl Cli {
    pub fn to_config(&self) -> ConfigParameter {
        let mut config = ConfigParameter::new();
        config.set_timeout(self.timeout);
        config.set_rate_limit(self.rate_limit);
        config.set_transport(self.transport);
        config.set_proxy(self.proxy.clone());
        config.set_max_response_size(self.max_response_size);
        config.set_secure(self.secure);
        config.set_no_color(self.no_color);
        config
    }

    pub fn level_filter(&self) -> LevelFilter {
        if self.verbose {
            return LevelFilter::Debug;
        }
        if self.quiet {
            return LevelFilter::Error;
        }
        self.log_level.parse().unwrap_or(LevelFilter::Warn)
    }

    pub fn parse_selection(&self) -> Option<Result<(usize, usize), String>> {
        self.selection.as_deref().map(parse_range)
    }
}

fn parse_range(range: &str) -> Result<(usize, usize), String> {
    let (start, end) = range
        .split_once(':')
        .ok_or_else(|| format!("selection must be START:END, got {:?}", range))?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid selection start: {:?}", start))?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|_| format!("invalid selection end: {:?}", end))?;
    if start >= end {
        return Err(format!("selection start {} must be before end {}", start, end));
    }
    Ok((start, end))
}
