//! Outbound delivery channels: signed JSON webhooks and email.

pub mod email;
pub mod webhook;
