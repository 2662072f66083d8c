// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Session state: the auth token and where it is persisted

mod storage;
mod store;

pub use storage::{FileStorage, KeyValueStore, MemoryStorage};
pub use store::{Session, SessionStore};
