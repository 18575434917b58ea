//! Email service for password recovery codes.
//!
//! Uses SMTP via lettre for delivery with Askama templates. When SMTP is not
//! configured the code is logged at WARN instead, so local setups can still
//! complete the recovery flow.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use tq_core::Email;

use crate::config::EmailConfig;
use crate::services::auth::RECOVERY_CODE_TTL_MINUTES;

/// HTML template for the recovery code email.
#[derive(Template)]
#[template(path = "email/recuperacion.html")]
struct RecoveryEmailHtml<'a> {
    nombre: &'a str,
    code: &'a str,
    minutes: i64,
}

/// Plain text template for the recovery code email.
#[derive(Template)]
#[template(path = "email/recuperacion.txt")]
struct RecoveryEmailText<'a> {
    nombre: &'a str,
    code: &'a str,
    minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a password recovery code.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_recovery_code(
        &self,
        to: &Email,
        nombre: &str,
        code: &str,
    ) -> Result<(), MailError> {
        let (text, html) = render_recovery(nombre, code)?;

        self.send_multipart_email(
            to.as_str(),
            "Tu código de recuperación de Tierra Querida",
            &text,
            &html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), MailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| MailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Deliver a recovery code, or log it when no mailer is configured.
///
/// Delivery failures are logged, not returned: the recovery endpoint answers
/// the same way whether or not the email went out.
pub async fn deliver_recovery_code(
    mailer: Option<&EmailService>,
    to: &Email,
    nombre: &str,
    code: &str,
) {
    match mailer {
        Some(mailer) => {
            if let Err(e) = mailer.send_recovery_code(to, nombre, code).await {
                tracing::error!(error = %e, "Failed to send recovery email");
            }
        }
        None => {
            tracing::warn!(
                to = %to,
                code = %code,
                "SMTP not configured; recovery code not emailed"
            );
        }
    }
}

fn render_recovery(nombre: &str, code: &str) -> Result<(String, String), askama::Error> {
    let minutes = RECOVERY_CODE_TTL_MINUTES;
    let text = RecoveryEmailText {
        nombre,
        code,
        minutes,
    }
    .render()?;
    let html = RecoveryEmailHtml {
        nombre,
        code,
        minutes,
    }
    .render()?;
    Ok((text, html))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_render_recovery_includes_code_and_expiry() {
        let (text, html) = render_recovery("Ana", "482913").unwrap();

        assert!(text.contains("Hola Ana,"));
        assert!(text.contains("482913"));
        assert!(text.contains("30 minutos"));
        assert!(html.contains("482913"));
    }

    #[test]
    fn test_render_recovery_escapes_html_only() {
        let (text, html) = render_recovery("<b>Ana</b>", "111111").unwrap();

        assert!(text.contains("<b>Ana</b>"));
        assert!(!html.contains("<b>Ana</b>"));
        assert!(html.contains("&lt;b&gt;Ana&lt;/b&gt;") || html.contains("&#60;b&#62;Ana"));
    }
}
