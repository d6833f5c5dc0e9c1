// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::engine::{IterationOutcome, ProbeResult};
use crate::service::HttpService;
use chrono::Utc;
use std::fs::File;
use std::io::{Result, Write};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format: {}", other)),
        }
    }
}

pub struct ReportGenerator;

impl ReportGenerator {
    pub fn generate_report(
        result: &ProbeResult,
        service: &HttpService,
        output_path: &Path,
        format: ReportFormat,
    ) -> Result<()> {
        let content = match format {
            ReportFormat::Text => Self::render_text(result, service),
            ReportFormat::Json => Self::render_json(result, service)?,
        };
        let mut file = File::create(output_path)?;
        writeln!(file, "{}", content)?;
        Ok(())
    }

    pub fn render_text(result: &ProbeResult, service: &HttpService) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} Session Discovery Report\n",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ));
        out.push_str(&format!("Date: {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC")));
        out.push_str(&format!("Target: {}\n", service));
        out.push_str(&format!("Match string: {:?}\n", result.match_string));
        out.push_str(&format!(
            "Cookies tested: {} ({} failed, {} ms)\n\n",
            result.stats.total_cookies(),
            result.stats.failed(),
            result.stats.elapsed_ms()
        ));

        for iteration in &result.iterations {
            let verdict = match &iteration.outcome {
                IterationOutcome::SessionEnded => "SESSION".to_string(),
                IterationOutcome::SessionActive => "no effect".to_string(),
                IterationOutcome::Failed { reason } => format!("failed: {}", reason),
            };
            let status = iteration
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "#{:<3} {:<24} [{}] {}\n",
                iteration.index, iteration.cookie.name, status, verdict
            ));
        }

        out.push('\n');
        if result.candidates.is_empty() {
            out.push_str("Session cookies: none found\n");
        } else {
            out.push_str("Session cookies:\n");
            for cookie in &result.candidates {
                out.push_str(&format!("  {}\n", cookie));
            }
        }
        out
    }

    pub fn render_json(result: &ProbeResult, service: &HttpService) -> Result<String> {
        let document = serde_json::json!({
            "generated_at": Utc::now(),
            "target": service,
            "result": result,
        });
        serde_json::to_string_pretty(&document).map_err(std::io::Error::from)
    }
}
