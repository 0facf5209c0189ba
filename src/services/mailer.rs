// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outgoing email.
//!
//! Messages go to an HTTP mail relay as JSON; the relay owns SMTP and
//! deliverability. Callers treat a send failure as a failure of the
//! operation that needed the mail (no reset code is usable unless it was
//! delivered).

use crate::config::Config;
use crate::error::AppError;
use crate::services::otp::OTP_TTL_MINUTES;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const MAIL_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl EmailMessage {
    /// The password reset code email.
    pub fn reset_code(to: &str, name: &str, code: &str) -> Self {
        let (greeting, html_greeting) = (greeting(name), greeting(&html_escape(name)));
        Self {
            to: to.to_string(),
            subject: "Your Chefini password reset code".to_string(),
            text: format!(
                "{greeting}\n\nYour password reset code is {code}. \
                 It expires in {OTP_TTL_MINUTES} minutes.\n\n\
                 If you didn't ask to reset your password, you can ignore this email.\n\n\
                 Chefini"
            ),
            html: format!(
                "<p>{html_greeting}</p>\
                 <p>Your password reset code is</p>\
                 <p style=\"font-size:28px;font-weight:bold;letter-spacing:6px\">{code}</p>\
                 <p>It expires in {OTP_TTL_MINUTES} minutes.</p>\
                 <p>If you didn't ask to reset your password, you can ignore this email.</p>\
                 <p>Chefini</p>"
            ),
        }
    }

    /// Notice sent after a password change or reset.
    pub fn password_changed(to: &str, name: &str) -> Self {
        let (greeting, html_greeting) = (greeting(name), greeting(&html_escape(name)));
        Self {
            to: to.to_string(),
            subject: "Your Chefini password was changed".to_string(),
            text: format!(
                "{greeting}\n\nThe password for your Chefini account was just changed. \
                 If this wasn't you, reset your password right away.\n\nChefini"
            ),
            html: format!(
                "<p>{html_greeting}</p>\
                 <p>The password for your Chefini account was just changed.</p>\
                 <p>If this wasn't you, reset your password right away.</p>\
                 <p>Chefini</p>"
            ),
        }
    }
}

fn greeting(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        "Hi,".to_string()
    } else {
        format!("Hi {},", name)
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// Mailer posting to an HTTP relay with a bearer key.
#[derive(Clone)]
pub struct HttpMailer {
    http: reqwest::Client,
    relay_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(MAIL_HTTP_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            relay_url: config.mail_relay_url.clone(),
            api_key: config.mail_api_key.clone(),
            from: config.mail_from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        let body = RelayRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.text,
            html: &message.html,
        };

        let response = self
            .http
            .post(&self.relay_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("mail relay request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %detail, "Mail relay rejected message");
            return Err(AppError::Upstream(format!(
                "mail relay returned status {status}"
            )));
        }

        tracing::info!(subject = %message.subject, "Sent email");
        Ok(())
    }
}
