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

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use sessprobe::cli::Cli;
use sessprobe::config::ConfigParameter;
use sessprobe::engine::{
    BaseTransaction, IterationOutcome, ProbeEngine, ProbeResult, ProbeState, DONE_LABEL,
};
use sessprobe::http::build_transport;
use sessprobe::httpinner::HttpInner;
use sessprobe::launch::launch;
use sessprobe::report::ReportGenerator;
use sessprobe::reporter::{ChannelReporter, ProbeEvent};
use sessprobe::request::HttpRequest;
use sessprobe::service::HttpService;

fn resolve_match_string(cli: &Cli, response: Option<&[u8]>) -> Result<String> {
    if let Some(match_string) = &cli.match_string {
        return Ok(match_string.clone());
    }

    let (Some(range), Some(response)) = (cli.parse_selection(), response) else {
        bail!("no match string given: use --match, or --response together with --selection");
    };
    let (start, end) = range.map_err(anyhow::Error::msg)?;
    let selected = HttpInner::from_raw(response.to_vec())
        .selection(start, end)
        .context("selection is empty or outside the base response")?;
    info!("Using selected text as match string: {:?}", selected);
    Ok(selected)
}

fn load_transactions(
    cli: &Cli,
    config: &ConfigParameter,
    response: Option<&[u8]>,
) -> Result<Vec<BaseTransaction>> {
    let mut transactions = Vec::new();

    for path in &cli.requests {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read request file {}", path.display()))?;

        let service = match &cli.target {
            Some(url) => HttpService::from_url(url)?,
            None => {
                let request = HttpRequest::parse(&raw)
                    .with_context(|| format!("cannot parse {}", path.display()))?;
                HttpService::from_request(&request, config.secure())?
            }
        };
        debug!("Loaded {} for {}", path.display(), service);

        let mut transaction = BaseTransaction::new(service, raw);
        if let Some(response) = response {
            transaction = transaction.with_response(response.to_vec());
        }
        transactions.push(transaction);
    }

    Ok(transactions)
}

async fn display_progress(mut receiver: UnboundedReceiver<ProbeEvent>) {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let mut announced = 0;
    while let Some(event) = receiver.recv().await {
        match event {
            ProbeEvent::CurrentTest(label) if label == DONE_LABEL => {
                pb.set_message("done");
            }
            ProbeEvent::CurrentTest(label) => {
                pb.set_message(format!("Testing without cookie {}", label.bold()));
            }
            ProbeEvent::Cookies(candidates) => {
                for cookie in candidates.iter().skip(announced) {
                    pb.println(format!(
                        "{} Session cookie found: {}",
                        "✓".green().bold(),
                        cookie.name.bold()
                    ));
                }
                announced = announced.max(candidates.len());
            }
        }
    }

    pb.finish_and_clear();
}

fn print_summary(result: &ProbeResult) {
    println!();
    for iteration in &result.iterations {
        let verdict = match &iteration.outcome {
            IterationOutcome::SessionEnded => "session ended".red().bold(),
            IterationOutcome::SessionActive => "still active".green(),
            IterationOutcome::Failed { reason } => format!("failed ({})", reason).yellow(),
        };
        let status = iteration
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{:<3} {:<24} {:>4}  {:>6} ms  {}",
            iteration.index, iteration.cookie.name, status, iteration.elapsed_ms, verdict
        );
    }

    println!();
    if result.candidates.is_empty() {
        println!("{}", "No session cookies found.".yellow());
    } else {
        println!("{}", "Session cookies:".bold());
        for cookie in &result.candidates {
            println!("  {}", cookie.to_string().cyan());
        }
    }
    println!(
        "{} cookies tested, {} failed, {} ms.",
        result.stats.total_cookies(),
        result.stats.failed(),
        result.stats.elapsed_ms()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    simple_logger::SimpleLogger::new()
        .with_level(cli.level_filter())
        .init()
        .context("failed to initialise logger")?;

    let config = cli.to_config();
    if config.no_color() {
        colored::control::set_override(false);
    }

    let response = match &cli.response {
        Some(path) => Some(
            fs::read(path)
                .with_context(|| format!("failed to read response file {}", path.display()))?,
        ),
        None => None,
    };

    let match_string = resolve_match_string(&cli, response.as_deref())?;
    let transactions = load_transactions(&cli, &config, response.as_deref())?;
    let service = transactions.first().map(|t| t.service.clone());

    let transport = build_transport(&config)?;
    let engine = Arc::new(ProbeEngine::new(transport, &config));
    let (reporter, receiver) = ChannelReporter::new();

    let handle = match launch(transactions, &match_string, engine, Arc::new(reporter)) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(if e.is_fatal() { 2 } else { 1 });
        }
    };

    display_progress(receiver).await;
    let result = handle.await.context("probe task failed")?;

    if result.state == ProbeState::Aborted {
        bail!("probe aborted: the base request could not be parsed");
    }

    print_summary(&result);

    if let (Some(path), Some(service)) = (&cli.output, &service) {
        ReportGenerator::generate_report(&result, service, path, cli.format)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        println!("{} Report written to {}", "✓".green().bold(), path.display());
    }

    Ok(())
}
