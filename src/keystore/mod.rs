//! Per-client RSA key pairs loaded from disk at startup.
//!
//! Layout: `<base>/keys/<client_id>/key` (PKCS#1 private key) and
//! `<base>/keys/<client_id>/key.pub` (SubjectPublicKeyInfo public key).

pub mod entry;
pub mod registry;

pub use entry::KeyEntry;
pub use registry::{KeyStoreLoader, KeyStoreRegistry, KEYS_DIR};
