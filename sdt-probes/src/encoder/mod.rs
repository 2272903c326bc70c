//! Probe encoding
//!
//! A [`ProbeEncoder`] turns the inlined calls of one compilation unit into
//! SDT note records. Every live encoder is listed in a shared
//! [`EncoderRegistry`].

mod diagnostics;
pub mod probe_encoder;
pub mod registry;
mod walker;

pub use diagnostics::render_lexblock;
pub use probe_encoder::{InlineExpansionRef, ProbeEncoder};
pub use registry::{EncoderRegistry, RegisteredEncoder};
