//! Outbound email delivery seam.
//!
//! The actual email provider lives outside this workspace. The backend only
//! needs to hand it a rendered campaign and learn whether it was accepted.
//! A provider failure never changes a newsletter's status on its own; the
//! caller decides what to persist.

use async_trait::async_trait;
use serde::Serialize;

use crate::audience_import::{is_valid_email, normalize_email};
use crate::error::CoreError;
use crate::types::DbId;

/// A campaign handed to the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub newsletter_id: DbId,
    pub subject: String,
    pub document: serde_json::Value,
    pub recipients: Vec<String>,
}

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    /// Provider-side id, when the provider returns one.
    pub provider_message_id: Option<String>,
    pub accepted_recipients: usize,
}

/// Why the provider did not accept a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("Delivery provider unavailable: {0}")]
    Unavailable(String),
}

/// External email delivery collaborator.
#[async_trait]
pub trait DeliveryProvider: Send + Sync {
    /// Send a single proof copy.
    async fn send_test(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError>;

    /// Send the campaign to its full recipient list.
    async fn deliver(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Result of a test send as reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSendOutcome {
    pub delivered: bool,
    pub to_email: String,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
}

/// Send a proof copy of a newsletter to `to_email`.
///
/// An invalid address is a validation error. A provider failure is not an
/// error here: it is reported in the outcome so the caller can show it
/// without touching the newsletter.
pub async fn send_test(
    provider: &dyn DeliveryProvider,
    newsletter_id: DbId,
    subject: &str,
    document: &serde_json::Value,
    to_email: &str,
) -> Result<TestSendOutcome, CoreError> {
    if !is_valid_email(to_email) {
        return Err(CoreError::Validation(format!(
            "Invalid test recipient '{}'",
            to_email.trim()
        )));
    }
    let to_email = normalize_email(to_email);

    let message = OutboundMessage {
        newsletter_id,
        subject: subject.to_string(),
        document: document.clone(),
        recipients: vec![to_email.clone()],
    };

    Ok(match provider.send_test(&message).await {
        Ok(receipt) => TestSendOutcome {
            delivered: true,
            to_email,
            provider_message_id: receipt.provider_message_id,
            error: None,
        },
        Err(e) => TestSendOutcome {
            delivered: false,
            to_email,
            provider_message_id: None,
            error: Some(e.to_string()),
        },
    })
}
