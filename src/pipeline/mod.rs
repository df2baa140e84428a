//! Pipeline stages for image embedding.
//!
//! Each submodule implements exactly one transformation step so each can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! note text ──▶ scan ──▶ (classify) ──▶ resolve ──▶ read ──▶ encode ──▶ rewrite
//!                refs     skip policy    vault path   bytes    data URI   spans
//! ```
//!
//! 1. [`scan`]    — find `![alt](path)` and `![[name.ext]]` references
//! 2. [`resolve`] — map a raw reference to a vault file (root, note folder,
//!    link name); the only stage that queries the store
//! 3. [`encode`]  — wrap asset bytes in a `data:<mime>;base64,…` URI
//!
//! Classification, reading and span rewriting are orchestrated by
//! [`crate::convert`].

pub mod encode;
pub mod resolve;
pub mod scan;
