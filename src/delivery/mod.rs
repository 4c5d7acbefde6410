//! Delivery collaborator.
//!
//! A [`Delivery`] is bound to exactly one destination when it is built. The
//! publisher only needs to know whether a message was accepted.

pub mod telegram;

use async_trait::async_trait;

use crate::render::FormattedMessage;
use crate::Result;

pub use telegram::TelegramDelivery;

/// Sends rendered messages to the destination channel.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Deliver `message`.
    ///
    /// `Ok(())` means the destination confirmed the message. Any error means
    /// it may not have been delivered.
    async fn deliver(&self, message: &FormattedMessage) -> Result<()>;
}
