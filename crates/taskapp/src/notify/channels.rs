//! Notification channel implementations.

use async_trait::async_trait;
use colored::Colorize;
use tracing::info;

use super::events::DeadlineEvent;
use crate::errors::TasksResult;

/// Trait for places a reminder can be delivered to.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled.
    fn enabled(&self) -> bool {
        true
    }

    /// Deliver a reminder.
    async fn send(&self, event: &DeadlineEvent) -> TasksResult<()>;
}

/// Emits reminders as structured `tracing` records
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

#[async_trait]
impl NotifyChannel for LogChannel {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, event: &DeadlineEvent) -> TasksResult<()> {
        info!(key = %event.key(), title = %event.title(), "{}", event.message());
        Ok(())
    }
}

/// Prints reminders to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleChannel;

#[async_trait]
impl NotifyChannel for ConsoleChannel {
    fn name(&self) -> &'static str {
        "console"
    }

    #[allow(clippy::disallowed_macros)]
    async fn send(&self, event: &DeadlineEvent) -> TasksResult<()> {
        println!("{} {}", "⏰".yellow(), event.title().bold());
        println!("   {}", event.message());
        Ok(())
    }
}
