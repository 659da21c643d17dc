//! Durable client-local state.
//!
//! A small key/value namespace backed by one file per key, with atomic
//! writes (temp file + rename). Two fixed keys are used: the device id
//! and the serialized history snapshot.

pub mod kv;

pub use kv::{DEVICE_ID_KEY, HISTORY_SNAPSHOT_KEY, KvStore};
