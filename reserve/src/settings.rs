//! The administrative surface: one free-text field holding the target id.
//!
//! The host renders the form and the notices; this module turns a submitted
//! form into exactly one allocation attempt and a [`Notice`] describing the
//! result. Operators always see the same generic message on failure, whatever
//! the underlying reason.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::allocator::GapAllocator;
use crate::config::Messages;
use crate::error::Result;
use crate::model::RecordId;

/// Values submitted through the settings form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsForm {
    /// Free-text numeric input.
    pub target_id: String,
}

impl SettingsForm {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
        }
    }
}

/// What the host should display after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The next record will receive `next_id`.
    Reserved {
        next_id: RecordId,
        placeholder: RecordId,
    },
    Error { message: String },
}

pub struct SettingsPage {
    allocator: Arc<GapAllocator>,
    messages: Messages,
}

impl SettingsPage {
    pub fn new(allocator: Arc<GapAllocator>, messages: Messages) -> Self {
        Self {
            allocator,
            messages,
        }
    }

    /// Label of the target field, naming the identifier the target must
    /// exceed.
    pub async fn field_label(&self) -> Result<String> {
        let current_max = self.allocator.inspector().current_max().await?;
        let threshold = current_max.get().saturating_add(1);
        Ok(self
            .messages
            .field_label
            .replace("{threshold}", &threshold.to_string()))
    }

    pub fn section_text(&self) -> &str {
        &self.messages.section_text
    }

    /// Runs one allocation for the submitted form.
    ///
    /// Empty or non-numeric input does not reach the allocator and yields the
    /// error notice.
    pub async fn submit(&self, form: &SettingsForm) -> Notice {
        let Some(target_id) = parse_target(&form.target_id) else {
            debug!(input = %form.target_id, "target id is not a positive integer");
            return self.error_notice();
        };
        match self.allocator.allocate(target_id).await {
            Ok(allocation) => Notice::Reserved {
                next_id: allocation.next_id,
                placeholder: allocation.assigned,
            },
            Err(_) => self.error_notice(),
        }
    }

    fn error_notice(&self) -> Notice {
        Notice::Error {
            message: self.messages.invalid_target.clone(),
        }
    }
}

/// Parses the free-text field. Surrounding whitespace is ignored.
pub fn parse_target(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}
