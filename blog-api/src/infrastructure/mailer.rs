use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use super::settings::SmtpSettings;

const SMTP_TIMEOUT: Duration = Duration::from_secs(5);
const SEND_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

pub(crate) const USER_WELCOME: &str = "user_welcome";

#[derive(Debug, Error)]
pub(crate) enum MailError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// A message ready to send: subject plus plain-text and HTML alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RenderedMail {
    pub(crate) subject: String,
    pub(crate) plain_body: String,
    pub(crate) html_body: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct WelcomeMail {
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) activation_token: String,
}

/// Embedded email templates. Each mail has `<name>/subject.txt`, `<name>/plain.txt`
/// and `<name>/body.html`.
pub(crate) struct MailTemplates {
    tera: Tera,
}

impl MailTemplates {
    pub(crate) fn new() -> Result<Self, MailError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (
                "user_welcome/subject.txt",
                include_str!("../../templates/user_welcome/subject.txt"),
            ),
            (
                "user_welcome/plain.txt",
                include_str!("../../templates/user_welcome/plain.txt"),
            ),
            (
                "user_welcome/body.html",
                include_str!("../../templates/user_welcome/body.html"),
            ),
        ])?;
        Ok(Self { tera })
    }

    pub(crate) fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<RenderedMail, MailError> {
        let context = Context::from_serialize(data)?;
        Ok(RenderedMail {
            subject: self
                .tera
                .render(&format!("{name}/subject.txt"), &context)?
                .trim()
                .to_string(),
            plain_body: self.tera.render(&format!("{name}/plain.txt"), &context)?,
            html_body: self.tera.render(&format!("{name}/body.html"), &context)?,
        })
    }
}

#[async_trait]
pub(crate) trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, mail: &RenderedMail) -> Result<(), MailError>;
}

pub(crate) struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    pub(crate) fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .timeout(Some(SMTP_TIMEOUT));
        if !settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            sender: settings.sender.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, recipient: &str, mail: &RenderedMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient.parse()?)
            .subject(mail.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                mail.plain_body.clone(),
                mail.html_body.clone(),
            ))?;

        let mut attempt = 1;
        loop {
            match self.transport.send(message.clone()).await {
                Ok(_) => return Ok(()),
                Err(err) if attempt < SEND_ATTEMPTS => {
                    tracing::warn!(attempt, error = %err, "mail delivery attempt failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MailTemplates, USER_WELCOME, WelcomeMail};

    #[test]
    fn welcome_mail_renders_all_parts() {
        let templates = MailTemplates::new().expect("templates must parse");
        let mail = templates
            .render(
                USER_WELCOME,
                &WelcomeMail {
                    user_id: 42,
                    username: "alice_writer".to_string(),
                    activation_token: "0123456789abcdef0123456789abcdef".to_string(),
                },
            )
            .expect("welcome mail must render");

        assert_eq!(mail.subject, "Welcome to the blog, alice_writer!");
        assert!(mail.plain_body.contains("user ID number is 42"));
        assert!(mail.plain_body.contains("0123456789abcdef0123456789abcdef"));
        assert!(mail.html_body.contains("<p>Hi alice_writer,</p>"));
    }

    #[test]
    fn html_part_escapes_user_input() {
        let templates = MailTemplates::new().expect("templates must parse");
        let mail = templates
            .render(
                USER_WELCOME,
                &WelcomeMail {
                    user_id: 1,
                    username: "<script>x</script>".to_string(),
                    activation_token: "token".to_string(),
                },
            )
            .expect("welcome mail must render");

        assert!(!mail.html_body.contains("<script>"));
        assert!(mail.plain_body.contains("<script>"));
    }

    #[test]
    fn unknown_template_is_an_error() {
        let templates = MailTemplates::new().expect("templates must parse");
        assert!(templates.render("password_reset", &serde_json::json!({})).is_err());
    }
}
