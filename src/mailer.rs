//! Composition and delivery of the digest email.

use crate::config::MailerConfig;
use crate::constants::DEFAULT_SMTP_PORT;
use crate::errors::{AppError, AppResult};
use crate::render::EmailBodies;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use lettre::message::MultiPart;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use tracing::info;

/// Address of the SMTP relay: `host`, `host:port`, a bare IPv6 address or
/// `[ipv6]:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpRelay {
    pub host: String,
    pub port: u16,
}

impl FromStr for SmtpRelay {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let parse_port = |port: &str| {
            port.parse::<u16>().map_err(|e| {
                AppError::ConfigError(format!("SMTP port in '{value}' is invalid: {e}"))
            })
        };

        let (host, port) = if let Some(bracketed) = value.strip_prefix('[') {
            let (host, rest) = bracketed.split_once(']').ok_or_else(|| {
                AppError::ConfigError(format!("SMTP server '{value}' has an unclosed '['"))
            })?;
            match rest {
                "" => (host, DEFAULT_SMTP_PORT),
                _ => match rest.strip_prefix(':') {
                    Some(port) => (host, parse_port(port)?),
                    None => {
                        return Err(AppError::ConfigError(format!(
                            "SMTP server '{value}' has trailing characters after ']'"
                        )))
                    }
                },
            }
        } else if value.matches(':').count() > 1 {
            // Unbracketed IPv6 literal, no port
            (value, DEFAULT_SMTP_PORT)
        } else {
            match value.rsplit_once(':') {
                Some((host, port)) => (host, parse_port(port)?),
                None => (value, DEFAULT_SMTP_PORT),
            }
        };

        if host.is_empty() {
            return Err(AppError::ConfigError(format!(
                "SMTP server '{value}' has no host"
            )));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for SmtpRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Builds the multipart/alternative message: plain text first, HTML second.
///
/// The envelope sender and recipients are the address parts of the From and To
/// mailboxes.
pub fn compose_email(config: &MailerConfig, bodies: &EmailBodies) -> AppResult<Message> {
    let builder = config
        .email_to
        .clone()
        .into_iter()
        .fold(Message::builder().from(config.email_from.clone()), |builder, to| {
            builder.to(to)
        });

    let message = builder
        .subject(config.email_subject.as_str())
        .multipart(MultiPart::alternative_plain_html(
            bodies.text.clone(),
            bodies.html.clone(),
        ))?;

    Ok(message)
}

/// Writes the fully formatted message to `out`.
pub fn print_message<W: Write>(message: &Message, out: &mut W) -> AppResult<()> {
    out.write_all(&message.formatted())?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// How the composed message leaves the process.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// Submit to an SMTP relay without authentication
    Smtp(SmtpRelay),
    /// Dry run: print the message to standard output
    Print,
}

impl Delivery {
    /// Chooses the delivery for this invocation; a real send needs a relay.
    pub fn for_run(dry_run: bool, config: &MailerConfig) -> AppResult<Self> {
        if dry_run {
            Ok(Self::Print)
        } else {
            Ok(Self::Smtp(config.require_smtp_server()?.clone()))
        }
    }

    /// Sends `message`. SMTP failures are returned to the caller; nothing is retried.
    pub async fn send(&self, message: Message) -> AppResult<()> {
        match self {
            Self::Smtp(relay) => {
                let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
                    relay.host.as_str(),
                )
                .port(relay.port)
                .build();

                transport.send(message).await?;
                info!(relay = %relay, "Email submitted");
            }
            Self::Print => {
                print_message(&message, &mut std::io::stdout().lock())?;
                info!("Dry run: email printed instead of sent");
            }
        }
        Ok(())
    }
}
