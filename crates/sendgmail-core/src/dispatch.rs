//! Maps command-line flags to the whoami, new-profile and send flows.

use std::io::Write;

use sendgmail_oauth::AuthFlow;
use tracing::debug;

use crate::error::{Error, Result};
use crate::gmail::{MailApi, Receipt};
use crate::interaction::Interaction;
use crate::lifecycle::CredentialManager;
use crate::message::OutboundMessage;
use crate::store::{CredentialCache, DeleteOutcome};

/// One invocation's worth of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the authenticated address.
    WhoAmI,
    /// Drop the cached credential, register again and print the new address.
    NewProfile,
    /// Send one email.
    Send {
        /// Recipient address.
        to: String,
        /// Subject line.
        subject: String,
        /// Message body.
        body: String,
    },
    /// Not enough information to send.
    MissingArguments,
}

impl Command {
    /// Picks the command from parsed flags.
    ///
    /// `newprofile` wins over `whoami`; both win over sending. Empty strings
    /// count as missing.
    #[must_use]
    pub fn from_flags(
        subject: Option<String>,
        recipient: Option<String>,
        message: Option<String>,
        whoami: bool,
        newprofile: bool,
    ) -> Self {
        if newprofile {
            return Self::NewProfile;
        }
        if whoami {
            return Self::WhoAmI;
        }

        let present = |value: Option<String>| value.filter(|v| !v.is_empty());
        match (present(recipient), present(subject), present(message)) {
            (Some(to), Some(subject), Some(body)) => Self::Send { to, subject, body },
            _ => Self::MissingArguments,
        }
    }
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The authenticated address was printed.
    Reported {
        /// Authenticated address.
        email: String,
    },
    /// A message was sent.
    Sent {
        /// Recipient address.
        to: String,
        /// Sender address.
        email: String,
        /// Identifiers returned by the API.
        receipt: Receipt,
    },
    /// Arguments were missing; nothing was done.
    Incomplete,
}

/// Runs `command`, writing the user-facing lines to `out`.
///
/// # Errors
///
/// Returns an error if acquiring a credential, a remote call, building the
/// message or writing to `out` fails.
pub async fn run<A, I, S, M, W>(
    command: Command,
    manager: &mut CredentialManager<A, I, S>,
    api: &M,
    out: &mut W,
) -> Result<Outcome>
where
    A: AuthFlow,
    I: Interaction,
    S: CredentialCache,
    M: MailApi,
    W: Write,
{
    debug!(?command, "dispatching");

    match command {
        Command::MissingArguments => {
            writeln!(out, "{}", Error::MissingArguments)?;
            Ok(Outcome::Incomplete)
        }
        Command::WhoAmI => {
            let acquired = manager.acquire(false).await?;
            let profile = api.get_profile(&acquired.session).await?;
            report_address(out, &profile.email_address)?;
            Ok(Outcome::Reported {
                email: profile.email_address,
            })
        }
        Command::NewProfile => {
            match manager.forget()? {
                DeleteOutcome::Deleted => writeln!(out, "Old token deleted")?,
                DeleteOutcome::NotFound => writeln!(out, "No token to delete")?,
            }
            let acquired = manager.acquire(false).await?;
            let profile = api.get_profile(&acquired.session).await?;
            report_address(out, &profile.email_address)?;
            Ok(Outcome::Reported {
                email: profile.email_address,
            })
        }
        Command::Send { to, subject, body } => {
            let acquired = manager.acquire(false).await?;
            let profile = api.get_profile(&acquired.session).await?;
            let message = OutboundMessage::build(&to, &subject, &body)?;
            let receipt = api.send_message(&acquired.session, &message).await?;
            writeln!(
                out,
                "Email sent to {to} using the email address {}",
                profile.email_address
            )?;
            Ok(Outcome::Sent {
                to,
                email: profile.email_address,
                receipt,
            })
        }
    }
}

fn report_address<W: Write>(out: &mut W, email: &str) -> Result<()> {
    writeln!(out, "The current registered email address is: {email}")?;
    Ok(())
}
