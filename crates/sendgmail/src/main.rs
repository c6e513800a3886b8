//! `sendgmail` - send plain-text email from the command line through Gmail.
//!
//! The first run walks through Google's OAuth consent screen and caches the
//! resulting credential; later runs reuse or refresh it.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use sendgmail_core::{
    Command, Config, ConsoleInteraction, CredentialManager, GmailClient, Outcome, run,
};
use sendgmail_oauth::{GMAIL_SCOPES, InstalledAppFlow};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code when subject, recipient or message is missing.
const EXIT_INCOMPLETE: u8 = 2;

/// Send an email through the Gmail API.
#[derive(Debug, Parser)]
#[command(name = "sendgmail", version, about)]
struct Cli {
    /// Email subject.
    #[arg(short, long)]
    subject: Option<String>,

    /// Recipient address.
    #[arg(short, long)]
    recipient: Option<String>,

    /// Email body.
    message: Option<String>,

    /// Print the address of the registered account.
    #[arg(long)]
    whoami: bool,

    /// Forget the registered account and register a new one.
    #[arg(long)]
    newprofile: bool,

    /// Directory holding credentials.json and the cached token.
    #[arg(long, env = "SENDGMAIL_CONFIG_DIR", value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli).await {
        Ok(Outcome::Incomplete) => ExitCode::from(EXIT_INCOMPLETE),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "sendgmail=debug,sendgmail_core=debug,sendgmail_oauth=debug"
    } else {
        "sendgmail=warn,sendgmail_core=warn,sendgmail_oauth=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

async fn execute(cli: Cli) -> anyhow::Result<Outcome> {
    let config = Config::new(cli.config_dir.unwrap_or_else(Config::default_dir));
    debug!(dir = %config.config_dir().display(), "using config directory");

    let command = Command::from_flags(
        cli.subject,
        cli.recipient,
        cli.message,
        cli.whoami,
        cli.newprofile,
    );

    let auth = InstalledAppFlow::new(config.client_secret_path(), GMAIL_SCOPES.iter().copied());
    let mut manager = CredentialManager::new(config, auth, ConsoleInteraction::stdio());
    let api = GmailClient::new();

    let mut stdout = io::stdout();
    let outcome = run(command, &mut manager, &api, &mut stdout).await?;
    stdout.flush().context("failed to flush stdout")?;
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::try_parse_from([
            "sendgmail", "-s", "Hi", "-r", "a@b.com", "body text",
        ])
        .unwrap();
        assert_eq!(cli.subject.as_deref(), Some("Hi"));
        assert_eq!(cli.recipient.as_deref(), Some("a@b.com"));
        assert_eq!(cli.message.as_deref(), Some("body text"));
        assert!(!cli.whoami);
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from(["sendgmail", "--whoami", "-v", "--config-dir", "/tmp/sg"])
            .unwrap();
        assert!(cli.whoami);
        assert!(cli.verbose);
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/sg")));
    }
}
