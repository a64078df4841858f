use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::backend_client::error_message;

const RESET_SUBJECT: &str = "Reset your Bill Pro password";

/// Transactional email through the Resend HTTP API.
pub struct MailService {
    config: Config,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

impl MailService {
    pub fn new(config: Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// `{APP_BASE_URL}/reset-password?token=...` with the token URL-encoded.
    pub fn reset_link(&self, token: &str) -> AppResult<String> {
        let base = format!(
            "{}/reset-password",
            self.config.app_base_url.trim_end_matches('/')
        );
        let url = reqwest::Url::parse_with_params(&base, &[("token", token)])
            .map_err(|e| AppError::Internal(format!("Invalid APP_BASE_URL: {}", e)))?;
        Ok(url.to_string())
    }

    pub async fn send_reset_email(&self, email: &str, reset_link: &str) -> AppResult<()> {
        if self.config.resend_api_key.is_empty() {
            return Err(AppError::Mail("RESEND_API_KEY missing.".to_string()));
        }

        let request = ResendRequest {
            from: &self.config.resend_from_email,
            to: [email],
            subject: RESET_SUBJECT,
            html: reset_password_html(email, reset_link),
        };
        let url = format!(
            "{}/emails",
            self.config.resend_api_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.resend_api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = error_message(&body).unwrap_or_else(|| "Failed to send email.".to_string());
            tracing::error!(%status, %message, "Email provider rejected message");
            return Err(AppError::Mail(message));
        }

        tracing::info!(to = email, "Password reset email sent");
        Ok(())
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn reset_password_html(email: &str, reset_link: &str) -> String {
    let email = escape_html(email);
    let link = escape_html(reset_link);
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>Reset Your Password</title>
  </head>
  <body style="margin:0;padding:0;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,Arial,sans-serif;background-color:#f4f4f5;">
    <table width="100%" cellpadding="0" cellspacing="0" style="background-color:#f4f4f5;padding:40px 0;">
      <tr>
        <td align="center">
          <table width="600" cellpadding="0" cellspacing="0" style="background-color:#ffffff;border-radius:8px;">
            <tr>
              <td style="padding:40px 40px 20px;text-align:center;">
                <h1 style="margin:0;font-size:24px;font-weight:600;color:#18181b;">Reset Your Password</h1>
              </td>
            </tr>
            <tr>
              <td style="padding:0 40px 30px;">
                <p style="margin:0 0 20px;font-size:16px;line-height:24px;color:#52525b;">Hi there,</p>
                <p style="margin:0 0 20px;font-size:16px;line-height:24px;color:#52525b;">We received a request to reset the password for your account (<strong>{email}</strong>).</p>
                <p style="margin:0 0 30px;font-size:16px;line-height:24px;color:#52525b;">Click the button below to reset your password:</p>
                <p style="text-align:center;margin:0 0 30px;">
                  <a href="{link}" style="display:inline-block;padding:12px 32px;background-color:#18181b;color:#ffffff;text-decoration:none;border-radius:6px;font-weight:600;">Reset Password</a>
                </p>
                <p style="margin:0 0 10px;font-size:14px;line-height:20px;color:#71717a;">Or copy and paste this link into your browser:</p>
                <p style="margin:0 0 30px;font-size:14px;line-height:20px;word-break:break-all;"><a href="{link}" style="color:#2563eb;">{link}</a></p>
                <p style="margin:0;font-size:14px;line-height:20px;color:#71717a;">If you didn't request a password reset, you can ignore this email.</p>
              </td>
            </tr>
          </table>
        </td>
      </tr>
    </table>
  </body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(resend_url: &str, key: &str) -> Config {
        let mut config = Config::for_tests("http://127.0.0.1:9");
        config.resend_api_url = resend_url.to_string();
        config.resend_api_key = key.to_string();
        config.app_base_url = "http://localhost:3000/".to_string();
        config
    }

    #[test]
    fn test_reset_link_encodes_token() {
        let service = MailService::new(config("http://unused", "key")).unwrap();
        assert_eq!(
            service.reset_link("a/b&c").unwrap(),
            "http://localhost:3000/reset-password?token=a%2Fb%26c"
        );
    }

    #[test]
    fn test_template_escapes_email() {
        let html = reset_password_html("<x>@example.com", "http://app/reset?token=1&x=2");
        assert!(html.contains("&lt;x&gt;@example.com"));
        assert!(html.contains("token=1&amp;x=2"));
    }

    #[tokio::test]
    async fn test_send_reset_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_partial_json(json!({
                "from": "noreply@billflow.test",
                "to": ["user@example.com"],
                "subject": "Reset your Bill Pro password"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "email_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let service = MailService::new(config(&server.uri(), "re_test")).unwrap();
        service
            .send_reset_email("user@example.com", "http://localhost:3000/reset-password?token=t")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_provider_error_message_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"message": "Invalid `from` field."})),
            )
            .mount(&server)
            .await;

        let service = MailService::new(config(&server.uri(), "re_test")).unwrap();
        let err = service
            .send_reset_email("user@example.com", "http://link")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid `from` field.");
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let service = MailService::new(config("http://unused", "")).unwrap();
        let err = service
            .send_reset_email("user@example.com", "http://link")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "RESEND_API_KEY missing.");
    }
}
