//! This module holds typed parameters for various endpoint inputs.
//!
//! Request bodies are deserialized into these types before any domain call, and the partial
//! update bodies convert themselves into the column → value maps the domain layer applies.

pub(crate) mod ask;
pub(crate) mod channel;
pub(crate) mod project;
pub(crate) mod short;
pub(crate) mod youtube;
