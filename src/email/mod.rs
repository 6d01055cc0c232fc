//! Inbound email types: envelope events and MIME normalization.

pub mod event;
pub mod normalize;

pub use event::EmailEvent;
pub use normalize::{InboundEmail, NormalizedRequest, normalize};
