use crate::error::TokenError;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::fs;
use std::path::Path;
use zeroize::Zeroizing;

/// File holding the PKCS#1 private key, matched case-insensitively.
pub const PRIVATE_KEY_FILE: &str = "key";
/// File holding the SubjectPublicKeyInfo public key, matched case-insensitively.
pub const PUBLIC_KEY_FILE: &str = "key.pub";

/// One client's signing/verification key pair.
///
/// Both halves are parsed and validated at load time, so an entry that exists
/// is always usable.
pub struct KeyEntry {
    client_id: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl KeyEntry {
    /// Read and parse a key pair from disk.
    pub fn load(client_id: &str, private_path: &Path, public_path: &Path) -> Result<Self, TokenError> {
        let private_pem = Zeroizing::new(
            fs::read_to_string(private_path)
                .map_err(|e| TokenError::key_load(private_path, format!("Error opening private key file: {}", e)))?,
        );
        let public_pem = fs::read_to_string(public_path)
            .map_err(|e| TokenError::key_load(public_path, format!("Error opening public key file: {}", e)))?;

        let encoding_key = parse_private_key(&private_pem)
            .map_err(|reason| TokenError::key_load(private_path, reason))?;
        let decoding_key = parse_public_key(&public_pem)
            .map_err(|reason| TokenError::key_load(public_path, reason))?;

        Ok(Self {
            client_id: client_id.to_string(),
            encoding_key,
            decoding_key,
        })
    }

    /// Build an entry from in-memory PEM text.
    pub fn from_pem(client_id: &str, private_pem: &str, public_pem: &str) -> Result<Self, TokenError> {
        let encoding_key = parse_private_key(private_pem)
            .map_err(|reason| TokenError::key_load(client_id, reason))?;
        let decoding_key = parse_public_key(public_pem)
            .map_err(|reason| TokenError::key_load(client_id, reason))?;

        Ok(Self {
            client_id: client_id.to_string(),
            encoding_key,
            decoding_key,
        })
    }

    /// Wrap keys that were parsed elsewhere. No validation is performed.
    #[must_use]
    pub fn from_keys(client_id: &str, encoding_key: EncodingKey, decoding_key: DecodingKey) -> Self {
        Self {
            client_id: client_id.to_string(),
            encoding_key,
            decoding_key,
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    #[must_use]
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for KeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEntry")
            .field("client_id", &self.client_id)
            .field("encoding_key", &"<redacted>")
            .field("decoding_key", &"<redacted>")
            .finish()
    }
}

fn parse_private_key(pem: &str) -> Result<EncodingKey, String> {
    let key = RsaPrivateKey::from_pkcs1_pem(pem)
        .map_err(|e| format!("Error parsing private key: {}", e))?;
    key.validate()
        .map_err(|e| format!("Private key failed validation: {}", e))?;

    let der = key
        .to_pkcs1_der()
        .map_err(|e| format!("Error encoding private key: {}", e))?;
    Ok(EncodingKey::from_rsa_der(der.as_bytes()))
}

fn parse_public_key(pem: &str) -> Result<DecodingKey, String> {
    let key = RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| format!("Error parsing public key: {}", e))?;

    let der = key
        .to_pkcs1_der()
        .map_err(|e| format!("Error converting public key to RSA: {}", e))?;
    Ok(DecodingKey::from_rsa_der(der.as_bytes()))
}
