use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use marquee_core::email::EmailSender;
use marquee_core::repository::BoxError;

use crate::dispatch::NotifyError;

/// SMTP-backed implementation of the outbound email interface.
#[derive(Clone)]
pub struct SmtpMailer {
    smtp_server: String,
    smtp_port: u16,
    credentials: Credentials,
    from_email: String,
    from_name: String,
}

impl SmtpMailer {
    pub fn new(
        smtp_server: String,
        smtp_port: u16,
        smtp_username: String,
        smtp_password: String,
        from_email: String,
        from_name: String,
    ) -> Self {
        Self {
            smtp_server,
            smtp_port,
            credentials: Credentials::new(smtp_username, smtp_password),
            from_email,
            from_name,
        }
    }

    /// A fresh transport per send avoids stale pooled connections.
    fn build_transport(&self) -> Result<SmtpTransport, NotifyError> {
        let transport = SmtpTransport::relay(&self.smtp_server)
            .map_err(|e| NotifyError::Delivery(format!("SMTP relay error: {e}")))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build();
        Ok(transport)
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), BoxError> {
        let email = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| NotifyError::Delivery(format!("invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| NotifyError::Delivery(format!("invalid to address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| NotifyError::Delivery(format!("failed to build email: {e}")))?;

        let mailer = self.build_transport()?;

        // lettre's SMTP transport is blocking; keep it off the async runtime.
        tokio::task::spawn_blocking(move || {
            mailer
                .send(&email)
                .map_err(|e| NotifyError::Delivery(format!("failed to send email: {e}")))
        })
        .await
        .map_err(|e| NotifyError::Delivery(format!("email task failed: {e}")))??;

        Ok(())
    }
}
