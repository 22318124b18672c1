//! Delivery provider used when no external email service is wired in.
//!
//! It accepts every message and records it in the log, which keeps the
//! send and test-send flows usable in development.

use async_trait::async_trait;
use pressroom_core::delivery::{DeliveryError, DeliveryProvider, DeliveryReceipt, OutboundMessage};
use uuid::Uuid;

/// Accepts every message and logs it.
#[derive(Debug, Default, Clone)]
pub struct LogDeliveryProvider;

impl LogDeliveryProvider {
    fn accept(kind: &str, message: &OutboundMessage) -> DeliveryReceipt {
        let provider_message_id = Uuid::new_v4().to_string();
        tracing::info!(
            newsletter_id = message.newsletter_id,
            recipients = message.recipients.len(),
            message_id = %provider_message_id,
            kind,
            subject = %message.subject,
            "Delivery accepted by log provider",
        );
        DeliveryReceipt {
            provider_message_id: Some(provider_message_id),
            accepted_recipients: message.recipients.len(),
        }
    }
}

#[async_trait]
impl DeliveryProvider for LogDeliveryProvider {
    async fn send_test(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        Ok(Self::accept("test", message))
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        Ok(Self::accept("campaign", message))
    }
}
