//! Outgoing mail for the password reset flow.

use inkwell_config::EmailConfig;
use inkwell_core::AppError;
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!(
            "{}/reset-password?token={}",
            self.config.frontend_url.trim_end_matches('/'),
            token
        )
    }

    #[instrument(skip(self, token))]
    pub async fn send_password_reset(
        &self,
        to_email: &str,
        username: &str,
        token: &str,
    ) -> Result<(), AppError> {
        let link = self.reset_link(token);
        let text_body = format!(
            "Hi {username},\n\n\
             You requested to reset your Inkwell password.\n\n\
             Open the link below to choose a new one:\n\
             {link}\n\n\
             This link expires in 1 hour. If you didn't request this, you can ignore this email."
        );
        let html_body = format!(
            "<p>Hi {username},</p>\
             <p>You requested to reset your Inkwell password.</p>\
             <p><a href=\"{link}\">Choose a new password</a></p>\
             <p>This link expires in 1 hour. If you didn't request this, you can ignore this email.</p>"
        );

        self.send(to_email, "Reset your Inkwell password", text_body, html_body)
            .await
    }

    #[instrument(skip(self))]
    pub async fn send_password_changed(&self, to_email: &str, username: &str) -> Result<(), AppError> {
        let text_body = format!(
            "Hi {username},\n\n\
             Your Inkwell password was just changed.\n\n\
             If you didn't make this change, please contact support immediately."
        );
        let html_body = format!(
            "<p>Hi {username},</p>\
             <p>Your Inkwell password was just changed.</p>\
             <p>If you didn't make this change, please contact support immediately.</p>"
        );

        self.send(to_email, "Your Inkwell password was changed", text_body, html_body)
            .await
    }

    async fn send(
        &self,
        to_email: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            info!(to = %to_email, subject, "Email delivery disabled, skipping send");
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);
        let email = Message::builder()
            .from(from.parse().map_err(AppError::internal)?)
            .to(to_email.parse().map_err(AppError::internal)?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(AppError::internal)?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(AppError::internal)?
                .port(self.config.smtp_port)
                .credentials(Credentials::new(
                    self.config.smtp_username.clone(),
                    self.config.smtp_password.clone(),
                ))
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(AppError::internal)?
            .map_err(AppError::internal)?;

        info!(to = %to_email, subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_link() {
        let service = EmailService::new(EmailConfig {
            frontend_url: "https://blog.example/".to_string(),
            ..EmailConfig::default()
        });
        assert_eq!(
            service.reset_link("abc"),
            "https://blog.example/reset-password?token=abc"
        );
    }

    #[tokio::test]
    async fn test_disabled_delivery_is_a_no_op() {
        let service = EmailService::new(EmailConfig::default());
        service
            .send_password_reset("ada@example.com", "ada", "token")
            .await
            .unwrap();
    }
}
