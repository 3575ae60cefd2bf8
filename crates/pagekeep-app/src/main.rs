// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagekeep — scanned-document library
//
// Entry point. Initialises logging and backend services, then runs one
// command-line operation.

mod cli;
mod services;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use pagekeep_core::PagekeepError;
use pagekeep_core::human_errors::humanize_error;

use cli::Cli;
use services::app_services::AppServices;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let Some(command) = args.command else {
        let _ = Cli::command().print_long_help();
        return ExitCode::SUCCESS;
    };

    let data_dir = args.data_dir.unwrap_or_else(services::data_dir::data_dir);
    tracing::info!(path = %data_dir.display(), "Pagekeep starting");

    // Without a document store there is nothing useful to do.
    let services = match AppServices::init(data_dir) {
        Ok(services) => services,
        Err(err) => {
            tracing::error!(error = %err, "Failed to initialise services");
            report(&err);
            return ExitCode::FAILURE;
        }
    };

    // `services` drops on return, taking the session scratch files with it.
    match cli::run(&services, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "Command failed");
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &PagekeepError) {
    let human = humanize_error(err);
    eprintln!("{}", human.message);
    eprintln!("{}", human.suggestion);
}
