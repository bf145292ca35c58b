//! Command-line entry point for deskenum.

mod args;
mod jwt;
mod output;

use anyhow::{Context, Result};
use args::{CliArgs, Command, DocsArgs, UsersArgs};
use clap::Parser;
use deskenum_client::{ResilientClient, RetryPolicy};
use deskenum_core::{AppConfig, DeskId};
use deskenum_scanner::{DeskFilter, EnumerationOptions, Orchestrator};
use output::Summary;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose {
        "info,deskenum=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(verbose).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Target settings every subcommand needs.
struct Session {
    config: AppConfig,
    base_url: String,
    cookie: String,
}

impl Session {
    fn resolve(args: &CliArgs) -> Result<Self> {
        let mut config = AppConfig::load_with_env(args.common.config.as_deref())
            .context("failed to load configuration")?;
        args.apply_to(&mut config);
        config.validate()?;

        let base_url = config
            .target
            .normalized_base_url()
            .context("no target URL: pass --url or set DESKENUM_URL")?;
        let cookie = config
            .target
            .cookie
            .clone()
            .filter(|cookie| !cookie.is_empty())
            .context("no session cookie: pass --cookie or set DESKENUM_COOKIE")?;

        Ok(Self {
            config,
            base_url,
            cookie,
        })
    }

    fn client(&self, cancel: &CancellationToken) -> Result<ResilientClient> {
        let settings = &self.config.client;
        let client = ResilientClient::new(&self.base_url, Duration::from_secs(settings.timeout_secs))?
            .with_credential(self.config.target.session_cookie, self.cookie.as_str())
            .with_retry_policy(RetryPolicy::new(
                settings.max_retries,
                Duration::from_millis(settings.backoff_base_ms),
            ))
            .with_cancellation(cancel.clone());
        Ok(client)
    }
}

/// Cancel `cancel` on the first Ctrl-C.
fn watch_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight searches");
            cancel.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.common.verbose);

    info!("Starting deskenum v{}", env!("CARGO_PKG_VERSION"));

    let session = Session::resolve(&args)?;
    let cancel = CancellationToken::new();
    watch_interrupt(cancel.clone());

    match &args.command {
        Command::Users(users) => {
            run_users(&session, users, args.common.output.as_deref(), &cancel).await
        }
        Command::Docs(docs) => run_docs(&session, docs, args.common.output.as_deref(), &cancel).await,
    }
}

async fn run_users(
    session: &Session,
    args: &UsersArgs,
    output: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    let enumeration = &session.config.enumeration;
    let mut options = EnumerationOptions::from_config(enumeration)?
        .with_cap(enumeration.max_users)
        .with_custom_query(args.query.clone());

    match jwt::subject(&session.cookie) {
        Some(account_id) => {
            tracing::debug!("Excluding own account {}", account_id);
            options = options.exclude_key(account_id);
        }
        None => tracing::warn!("Could not read the account id from the session cookie"),
    }

    let desk = args.desk.clone().map(DeskId::new).transpose()?;
    let orchestrator = Orchestrator::new(session.client(cancel)?, options)
        .with_user_page_size(enumeration.user_page_size);

    let outcome = orchestrator
        .enumerate_users(&DeskFilter::from_option(desk), cancel)
        .await
        .context("user enumeration failed")?;

    for desk in outcome.desks.iter().filter(|d| d.error.is_some()) {
        tracing::error!(
            "Desk {} skipped: {}",
            desk.desk.label(),
            desk.error.as_deref().unwrap_or_default()
        );
    }

    let summary = Summary {
        unique: outcome.records.len(),
        searches: outcome.searches(),
        failed_branches: outcome.failed_branches(),
        capped: outcome.capped(),
        interrupted: outcome.interrupted,
        elapsed: outcome.elapsed(),
    };

    let mut stdout = std::io::stdout().lock();
    if outcome.records.is_empty() {
        writeln!(stdout, "\nNo users found")?;
    } else if let Some(path) = output {
        output::save(path, |file| output::write_users_csv(file, &outcome.records))?;
        writeln!(
            stdout,
            "\nWrote {} users to {}",
            outcome.records.len(),
            path.display()
        )?;
    } else {
        output::print_users(&mut stdout, &outcome.records)?;
    }
    summary.render(&mut stdout, "users")?;
    Ok(())
}

async fn run_docs(
    session: &Session,
    args: &DocsArgs,
    output: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    let enumeration = &session.config.enumeration;
    let options =
        EnumerationOptions::from_config(enumeration)?.with_custom_query(args.query.clone());
    let orchestrator = Orchestrator::new(session.client(cancel)?, options)
        .with_docs_limit(enumeration.docs_page_size);

    let report = orchestrator
        .enumerate_documents(cancel)
        .await
        .context("document enumeration failed")?;

    let summary = Summary {
        unique: report.records.len(),
        searches: report.searches,
        failed_branches: report.failed_branches,
        capped: report.capped,
        interrupted: report.interrupted,
        elapsed: report.elapsed(),
    };

    let mut stdout = std::io::stdout().lock();
    if report.records.is_empty() {
        writeln!(stdout, "\nNo documents found")?;
    } else if let Some(path) = output {
        output::save(path, |file| output::write_documents_csv(file, &report.records))?;
        writeln!(
            stdout,
            "\nWrote {} documents to {}",
            report.records.len(),
            path.display()
        )?;
    } else {
        output::print_documents(&mut stdout, &report.records)?;
    }
    summary.render(&mut stdout, "documents")?;
    Ok(())
}
