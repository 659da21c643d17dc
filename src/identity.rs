//! Device identity provider.
//!
//! Produces a stable pseudo-random identifier for this client, used only as
//! a correlation key between a search and its later suggestion fetch. The
//! id is a SHA-256 digest of locally available machine signals, formatted as
//! a UUID (the service types its `user` parameter that way), computed once
//! and persisted. It is never interpreted locally.

use std::env;
use std::fmt;

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::storage::kv::{DEVICE_ID_KEY, KvStore};

/// Opaque per-device correlation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Return the persisted device id, computing and persisting it on first call.
///
/// Returns `None` when no machine signals are available; callers must then
/// omit the correlation key rather than fabricate one. A failed persist is
/// logged and the computed id is still returned for this process.
pub fn get_or_create_device_id(kv: &KvStore) -> Option<DeviceId> {
    match kv.get(DEVICE_ID_KEY) {
        Ok(Some(existing)) => return Some(DeviceId(existing)),
        Ok(None) => {}
        Err(err) => warn!("failed to read stored device id: {err:#}"),
    }

    let id = fingerprint()?;
    if let Err(err) = kv.put(DEVICE_ID_KEY, &id) {
        warn!("failed to persist device id: {err:#}");
    }
    Some(DeviceId(id))
}

/// Digest the available machine signals into a UUID-shaped identifier.
fn fingerprint() -> Option<String> {
    let user = env::var("USER").or_else(|_| env::var("USERNAME")).ok();
    let home = dirs::home_dir().map(|p| p.display().to_string());
    if user.is_none() && home.is_none() {
        return None;
    }

    let hostname = env::var("HOSTNAME").ok();
    let lang = env::var("LANG").ok();

    let mut hasher = Sha256::new();
    let env_signals =
        [user.as_deref(), home.as_deref(), hostname.as_deref(), lang.as_deref()];
    for signal in env_signals.into_iter().flatten() {
        hasher.update(signal.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(env::consts::OS.as_bytes());
    hasher.update(env::consts::ARCH.as_bytes());

    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Some(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
}
