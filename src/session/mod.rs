//! Session token holder and its persistence backends.
//!
//! This module provides the `SessionStore` that owns the current
//! authentication token for the process, together with the
//! `SessionStorage` backends it persists through.
//!
//! The store rehydrates the last persisted token when opened and writes
//! every mutation straight back, so a token survives process restarts
//! without any explicit load or flush call.

pub mod storage;
pub mod store;

pub use storage::{FileStorage, KeyringStorage, MemoryStorage, SessionStorage};
pub use store::{SessionState, SessionStore};
