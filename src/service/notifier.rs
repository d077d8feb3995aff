use crate::api::email_api::{EmailApi, MailReceipt, welcome_message};
use crate::api::sms_api::{BulkSendRequest, BulkSendResponse, SmsApi, is_sendable_phone, normalize_phone};
use crate::config::{Config, EmailConfig, SmsConfig};
use crate::db::models::ContactType;
use crate::error::DeskError;
use crate::service::validation::is_valid_email;
use crate::types::notify::{EmailOutcome, SmsOutcome};
use crate::types::visitor::CreatedVisitor;
use backon::ExponentialBuilder;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
}

/// Sends welcome SMS and email messages. Failures are reported in the
/// returned outcome and never bubble up as errors.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    sms: SmsConfig,
    email: EmailConfig,
    exhibition: String,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl Notifier {
    pub fn new(cfg: &Config) -> Result<Self, DeskError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("visitor-desk/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()?;
        let per_minute = NonZeroU32::new(cfg.notify.per_minute).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            client,
            sms: cfg.sms.clone(),
            email: cfg.email.clone(),
            exhibition: cfg.notify.exhibition_name.clone(),
            limiter,
        })
    }

    fn render_sms(&self, visitor_name: &str, exhibition: &str) -> String {
        self.sms
            .message_template
            .replace("{name}", visitor_name)
            .replace("{website}", &self.sms.website)
            .replace("{exhibition}", exhibition)
    }

    pub async fn send_sms(
        &self,
        phone: &str,
        visitor_name: &str,
        exhibition: Option<&str>,
    ) -> SmsOutcome {
        let Some(api_key) = self.sms.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return SmsOutcome {
                success: false,
                message_id: None,
                phone_number: phone.to_string(),
                error: Some("SMS provider not configured".to_string()),
            };
        };

        let mobile = normalize_phone(phone);
        let text = self.render_sms(visitor_name, exhibition.unwrap_or(&self.exhibition));
        let body = BulkSendRequest {
            line_number: self.sms.line_number,
            message_text: &text,
            mobiles: vec![mobile.clone()],
            send_date_time: None,
        };

        self.limiter.until_ready().await;
        let failed = |error: String| SmsOutcome {
            success: false,
            message_id: None,
            phone_number: phone.to_string(),
            error: Some(error),
        };

        let resp = match SmsApi::try_send_bulk(
            self.client.clone(),
            &self.sms.api_url,
            api_key,
            default_retry_policy(),
            &body,
        )
        .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(phone = %mobile, error = %e, "SMS request failed");
                return failed(e.to_string());
            }
        };

        let status = resp.status();
        let reply = match resp.json::<BulkSendResponse>().await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(phone = %mobile, %status, error = %e, "unreadable SMS provider reply");
                return failed(format!("provider returned {status}"));
            }
        };

        if status.is_success() && reply.accepted() {
            info!(phone = %mobile, "SMS sent");
            SmsOutcome {
                success: true,
                message_id: reply.message_id(),
                phone_number: mobile,
                error: None,
            }
        } else {
            let message = reply
                .message
                .clone()
                .unwrap_or_else(|| format!("provider returned {status}"));
            warn!(phone = %mobile, %status, provider_status = reply.status, "SMS rejected");
            failed(message)
        }
    }

    pub async fn send_email(
        &self,
        address: &str,
        visitor_name: &str,
        exhibition: Option<&str>,
    ) -> EmailOutcome {
        let failed = |error: &str| EmailOutcome {
            success: false,
            message_id: None,
            email: address.to_string(),
            error: Some(error.to_string()),
        };

        let (Some(url), Some(from)) = (self.email.api_url.as_deref(), self.email.from.as_deref())
        else {
            return failed("Email transport not configured");
        };
        if !is_valid_email(address) {
            return failed("Invalid email format");
        }

        let exhibition = exhibition.unwrap_or(&self.exhibition);
        let message = match welcome_message(from, address, visitor_name, exhibition) {
            Ok(message) => message,
            Err(e) => {
                warn!(email = %address, error = %e, "welcome template failed to render");
                return failed(&e.to_string());
            }
        };
        let api_key = self.email.api_key.as_deref().filter(|k| !k.is_empty());

        self.limiter.until_ready().await;
        let resp = match EmailApi::try_send(
            self.client.clone(),
            url,
            api_key,
            default_retry_policy(),
            &message,
        )
        .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(email = %address, error = %e, "email request failed");
                return failed(&e.to_string());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            warn!(email = %address, %status, "email rejected by relay");
            return failed(&format!("mail relay returned {status}"));
        }
        let receipt = resp.json::<MailReceipt>().await.unwrap_or_default();
        info!(email = %address, "email sent");
        EmailOutcome {
            success: true,
            message_id: receipt.into_id(),
            email: address.to_string(),
            error: None,
        }
    }

    /// Greets a new visitor on the first phone and first email contact,
    /// recording each outcome on the response.
    pub async fn welcome(&self, created: &mut CreatedVisitor) {
        let name = created.visitor.full_name();
        let phone = created
            .visitor
            .first_contact(ContactType::Phone)
            .map(|c| c.value.clone());
        let email = created
            .visitor
            .first_contact(ContactType::Email)
            .map(|c| c.value.clone());

        let sms = async {
            let phone = phone?;
            if !is_sendable_phone(&phone) {
                info!(phone = %phone, "invalid phone number format, skipping SMS");
                return Some((false, Some("Invalid phone number format".to_string())));
            }
            let outcome = self.send_sms(&phone, &name, None).await;
            Some((outcome.success, outcome.error))
        };
        let mail = async {
            let email = email?;
            if !is_valid_email(&email) {
                info!(email = %email, "invalid email format, skipping email");
                return Some((false, Some("Invalid email format".to_string())));
            }
            let outcome = self.send_email(&email, &name, None).await;
            Some((outcome.success, outcome.error))
        };

        let (sms, mail) = tokio::join!(sms, mail);
        if let Some((sent, error)) = sms {
            created.sms_sent = Some(sent);
            created.sms_error = error;
        }
        if let Some((sent, error)) = mail {
            created.email_sent = Some(sent);
            created.email_error = error;
        }
    }
}
