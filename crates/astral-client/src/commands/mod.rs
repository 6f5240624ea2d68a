//! User-action entry points.
//!
//! Each action fetches or mutates over REST, then applies the outcome to
//! the owning reconciler. A failed request leaves local state untouched
//! and propagates the error; the only exceptions are the explicitly
//! optimistic flows (comment like), which revert on failure. The state
//! mutex is never held across an await.

pub mod chat;
pub mod comments;
pub mod friends;
pub mod notifications;
