//! Platform client seam.
//!
//! The watcher never talks to a messaging platform directly; everything it
//! needs is behind [`PlatformClient`], so tests drive the pipeline with a
//! recording fake and a production binary plugs in a real transport.

use crate::error::PlatformError;
use emojirelay_core::{Document, StyleRange};
use std::future::Future;

/// One message delivered by the platform, new or edited.
///
/// `ranges` carry UTF-16 code-unit offsets, matching the platform's own
/// entity offsets.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub channel_id: i64,
    pub message_id: i64,
    pub text: String,
    pub ranges: Vec<StyleRange>,
    pub edited: bool,
}

/// Outbound edit capability of a messaging platform.
pub trait PlatformClient: Send + Sync {
    /// Replace a message's text and style ranges with the rewritten document.
    fn edit_message(
        &self,
        channel_id: i64,
        message_id: i64,
        document: &Document,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;
}
