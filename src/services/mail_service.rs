use askama::Template;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(
        &self,
        subject: &str,
        content: &str,
        to: &[String],
        cc: &[String],
        bcc: &[String],
    ) -> Result<()>;
}

/// Sends HTML mail over an SMTP relay with STARTTLS. Every message opens a
/// fresh session.
pub struct SmtpSender {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSender {
    pub fn new(config: &Config) -> Result<Self> {
        let address: Address = config
            .email_sender_address
            .parse()
            .map_err(|e| Error::Config(format!("Invalid EMAIL_SENDER_ADDRESS: {}", e)))?;
        let from = Mailbox::new(Some(config.email_sender_name.clone()), address);

        let credentials = Credentials::new(
            config.email_sender_address.clone(),
            config.email_sender_password.clone(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| Error::Config(format!("Invalid SMTP_HOST: {}", e)))?
            .credentials(credentials)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self { from, transport })
    }
}

fn parse_mailbox(raw: &str) -> Result<Mailbox> {
    raw.parse::<Mailbox>()
        .map_err(|e| Error::Mail(format!("invalid recipient {}: {}", raw, e)))
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send_email(
        &self,
        subject: &str,
        content: &str,
        to: &[String],
        cc: &[String],
        bcc: &[String],
    ) -> Result<()> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML);
        for addr in to {
            builder = builder.to(parse_mailbox(addr)?);
        }
        for addr in cc {
            builder = builder.cc(parse_mailbox(addr)?);
        }
        for addr in bcc {
            builder = builder.bcc(parse_mailbox(addr)?);
        }
        let message = builder
            .body(content.to_string())
            .map_err(|e| Error::Mail(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| Error::Mail(e.to_string()))?;

        tracing::info!(subject, recipients = to.len(), "email sent");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

#[derive(Template)]
#[template(path = "emails/verify_email.html")]
struct VerifyEmailTemplate<'a> {
    full_name: &'a str,
    verify_url: &'a str,
    valid_minutes: i64,
}

#[derive(Template)]
#[template(path = "emails/application_received.html")]
struct ApplicationReceivedTemplate<'a> {
    full_name: &'a str,
    position: &'a str,
    company_name: &'a str,
}

/// `<base>/api/v1/users/verify-email?id=<id>&code=<code>`, keeping any path
/// prefix of `base_url`.
pub fn verify_email_url(base_url: &str, id: i64, secret_code: &str) -> Result<String> {
    let mut base = Url::parse(base_url)
        .map_err(|e| Error::Config(format!("Invalid APP_BASE_URL: {}", e)))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut url = base
        .join("api/v1/users/verify-email")
        .map_err(|e| Error::Config(format!("Invalid APP_BASE_URL: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("id", &id.to_string())
        .append_pair("code", secret_code);
    Ok(url.into())
}

pub fn render_verification_email(
    full_name: &str,
    verify_url: &str,
    valid_minutes: i64,
) -> Result<RenderedEmail> {
    let html = VerifyEmailTemplate {
        full_name,
        verify_url,
        valid_minutes,
    }
    .render()
    .map_err(|e| Error::Mail(format!("rendering verification email failed: {}", e)))?;
    Ok(RenderedEmail {
        subject: "Welcome to Job Marketplace".to_string(),
        html,
    })
}

pub fn render_confirmation_email(
    full_name: &str,
    position: &str,
    company_name: &str,
) -> Result<RenderedEmail> {
    let html = ApplicationReceivedTemplate {
        full_name,
        position,
        company_name,
    }
    .render()
    .map_err(|e| Error::Mail(format!("rendering confirmation email failed: {}", e)))?;
    Ok(RenderedEmail {
        subject: format!("Application received: {} at {}", position, company_name),
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_url_carries_id_and_code() {
        let url = verify_email_url("http://localhost:8080", 42, "abcDEF123").unwrap();
        assert_eq!(
            url,
            "http://localhost:8080/api/v1/users/verify-email?id=42&code=abcDEF123"
        );
    }

    #[test]
    fn verify_url_keeps_base_path_prefix() {
        let expected = "https://jobs.example.com/app/api/v1/users/verify-email?id=7&code=xyz";
        for base in ["https://jobs.example.com/app", "https://jobs.example.com/app/"] {
            assert_eq!(verify_email_url(base, 7, "xyz").unwrap(), expected);
        }
    }

    #[test]
    fn verify_url_rejects_garbage_base() {
        assert!(verify_email_url("not a url", 1, "x").is_err());
    }

    #[test]
    fn verification_email_links_to_url() {
        let url = "http://localhost:8080/api/v1/users/verify-email?id=1&code=abc";
        let mail = render_verification_email("Alice <script>", url, 15).unwrap();
        assert!(mail.html.contains("Alice &lt;script&gt;"));
        assert!(!mail.html.contains("<script>"));
        assert!(mail.html.contains("id=1&amp;code=abc"));
        assert!(mail.html.contains("valid for 15 minutes"));
        assert_eq!(mail.subject, "Welcome to Job Marketplace");
    }

    #[test]
    fn confirmation_email_names_position_and_company() {
        let mail = render_confirmation_email("Bob", "Senior Go Engineer", "Acme & Co").unwrap();
        assert!(mail.html.contains("Dear Bob"));
        assert!(mail.html.contains("Senior Go Engineer"));
        assert!(mail.html.contains("Acme &amp; Co"));
        assert!(mail.subject.contains("Acme & Co"));
    }

    #[tokio::test]
    async fn mock_sender_records_recipients() {
        let mut sender = MockEmailSender::new();
        sender
            .expect_send_email()
            .withf(|subject, _, to, cc, bcc| {
                subject.eq("hi")
                    && to.len() == 1
                    && to[0] == "a@example.com"
                    && cc.is_empty()
                    && bcc.is_empty()
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));

        sender
            .send_email("hi", "<p>x</p>", &["a@example.com".to_string()], &[], &[])
            .await
            .unwrap();
    }
}
