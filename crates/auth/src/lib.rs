//! Local sign-in against built-in credentials. There is no server; the
//! session is a random token persisted in the on-device store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use core_types::{KvStore, StoreError};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

const TOKEN_KEY: &str = "userToken";

/// The only account this offline build knows about.
pub const BUILTIN_USERNAME: &str = "demo";
pub const BUILTIN_PASSWORD: &str = "notes123";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username and password must not be blank")]
    MissingCredentials,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Capability object for the signed-in state. Constructed once at startup,
/// passed by handle; mutated only through `sign_in`/`sign_out`.
pub struct AuthManager {
    store: Arc<dyn KvStore>,
    signed_in: AtomicBool,
}

impl AuthManager {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            signed_in: AtomicBool::new(false),
        }
    }

    /// Checks the credentials against the built-in account and, on success,
    /// persists a fresh session token.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let candidate = Sha256::digest(password.as_bytes());
        let expected = Sha256::digest(BUILTIN_PASSWORD.as_bytes());
        if username != BUILTIN_USERNAME || candidate != expected {
            return Err(AuthError::InvalidCredentials);
        }

        self.store.set(TOKEN_KEY, &generate_token()).await?;
        self.signed_in.store(true, Ordering::Relaxed);
        info!("user signed in");
        Ok(())
    }

    /// Reads the persisted token at startup. Any non-empty token counts as a
    /// valid session.
    pub async fn restore_session(&self) -> Result<bool, AuthError> {
        let token = self.store.get(TOKEN_KEY).await?;
        let signed_in = token.map(|value| !value.trim().is_empty()).unwrap_or(false);
        self.signed_in.store(signed_in, Ordering::Relaxed);
        Ok(signed_in)
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.store.remove(TOKEN_KEY).await?;
        self.signed_in.store(false, Ordering::Relaxed);
        info!("user signed out");
        Ok(())
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in.load(Ordering::Relaxed)
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}
