//! Out-of-band PSK credentials.
//!
//! External PSKs are established outside of TLS (manual configuration, an
//! HSM, a key agreement protocol). The client holds one username and key;
//! the server advertises one identity (the hint) and resolves its key from a
//! keyed store.

use std::collections::HashMap;
use std::fmt;

use hsauth_crypto::HashAlgorithm;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Produces a (username, key) pair on demand.
pub type PskCallback =
    Box<dyn Fn() -> Result<(Vec<u8>, Zeroizing<Vec<u8>>)> + Send + Sync>;

enum ClientPskSource {
    Static {
        username: Vec<u8>,
        key: Zeroizing<Vec<u8>>,
    },
    Callback(PskCallback),
}

/// Client-side external PSK.
pub struct ClientPskCredentials {
    source: ClientPskSource,
    binder_prf: HashAlgorithm,
}

impl ClientPskCredentials {
    /// A fixed username and key.
    pub fn new(username: impl Into<Vec<u8>>, key: Zeroizing<Vec<u8>>) -> Self {
        Self {
            source: ClientPskSource::Static {
                username: username.into(),
                key,
            },
            binder_prf: HashAlgorithm::Sha256,
        }
    }

    /// Ask `callback` for the username and key each time a PSK is offered.
    pub fn from_callback(callback: PskCallback) -> Self {
        Self {
            source: ClientPskSource::Callback(callback),
            binder_prf: HashAlgorithm::Sha256,
        }
    }

    /// Hash the binder is computed with (SHA-256 unless changed).
    pub fn with_binder_prf(mut self, prf: HashAlgorithm) -> Self {
        self.binder_prf = prf;
        self
    }

    /// Hash the binder is computed with.
    pub fn binder_prf(&self) -> HashAlgorithm {
        self.binder_prf
    }

    /// Resolve the username and key.
    pub fn credentials(&self) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>)> {
        match &self.source {
            ClientPskSource::Static { username, key } => Ok((username.clone(), key.clone())),
            ClientPskSource::Callback(callback) => {
                debug!("resolving PSK through callback");
                callback()
            }
        }
    }
}

impl fmt::Debug for ClientPskCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            ClientPskSource::Static { .. } => "static",
            ClientPskSource::Callback(_) => "callback",
        };
        f.debug_struct("ClientPskCredentials")
            .field("source", &source)
            .field("binder_prf", &self.binder_prf)
            .finish()
    }
}

/// Server-side external PSKs.
#[derive(Default)]
pub struct ServerPskCredentials {
    hint: Option<Vec<u8>>,
    keys: HashMap<Vec<u8>, Zeroizing<Vec<u8>>>,
    binder_prf: Option<HashAlgorithm>,
}

impl ServerPskCredentials {
    /// Empty store with SHA-256 binders.
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity matched against the client's offered PSKs.
    ///
    /// Without a hint no external PSK is ever accepted; tickets still are.
    pub fn with_hint(mut self, hint: impl Into<Vec<u8>>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Hash the binder is verified with.
    pub fn with_binder_prf(mut self, prf: HashAlgorithm) -> Self {
        self.binder_prf = Some(prf);
        self
    }

    /// Register the key for `username`, replacing any previous one.
    pub fn add_key(&mut self, username: impl Into<Vec<u8>>, key: Zeroizing<Vec<u8>>) {
        self.keys.insert(username.into(), key);
    }

    /// Remove the key for `username`.
    pub fn remove_key(&mut self, username: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
        self.keys.remove(username)
    }

    /// The configured hint.
    pub fn hint(&self) -> Option<&[u8]> {
        self.hint.as_deref()
    }

    /// Hash the binder is verified with.
    pub fn binder_prf(&self) -> HashAlgorithm {
        self.binder_prf.unwrap_or(HashAlgorithm::Sha256)
    }

    /// Key stored for `username`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCredential`] when no key is stored.
    pub fn lookup(&self, username: &[u8]) -> Result<&Zeroizing<Vec<u8>>> {
        self.keys.get(username).ok_or_else(|| {
            Error::InvalidCredential(format!(
                "no key for a {}-byte username",
                username.len()
            ))
        })
    }

    /// The hint and its key, if a hint is configured.
    pub(crate) fn hint_entry(&self) -> Result<Option<(&[u8], &Zeroizing<Vec<u8>>)>> {
        match self.hint.as_deref() {
            Some(hint) => Ok(Some((hint, self.lookup(hint)?))),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for ServerPskCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerPskCredentials")
            .field("hint", &self.hint.as_ref().map(|h| String::from_utf8_lossy(h)))
            .field("keys", &self.keys.len())
            .field("binder_prf", &self.binder_prf())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_static_credentials() {
        let creds = ClientPskCredentials::new("alice", Zeroizing::new(vec![1; 32]))
            .with_binder_prf(HashAlgorithm::Sha384);
        let (username, key) = creds.credentials().unwrap();
        assert_eq!(username, b"alice");
        assert_eq!(&key[..], &[1; 32]);
        assert_eq!(creds.binder_prf(), HashAlgorithm::Sha384);
    }

    #[test]
    fn test_callback_runs_per_resolution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let creds = ClientPskCredentials::from_callback(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok((b"bob".to_vec(), Zeroizing::new(vec![2; 32])))
        }));
        creds.credentials().unwrap();
        creds.credentials().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(creds.binder_prf(), HashAlgorithm::Sha256);
    }

    #[test]
    fn test_callback_errors_propagate() {
        let creds = ClientPskCredentials::from_callback(Box::new(|| {
            Err(Error::InvalidCredential("locked".into()))
        }));
        assert!(matches!(creds.credentials(), Err(Error::InvalidCredential(_))));
    }

    #[test]
    fn test_server_hint_resolution() {
        let mut creds = ServerPskCredentials::new().with_hint("alice");
        assert!(matches!(creds.hint_entry(), Err(Error::InvalidCredential(_))));

        creds.add_key("alice", Zeroizing::new(vec![3; 32]));
        let (hint, key) = creds.hint_entry().unwrap().unwrap();
        assert_eq!(hint, b"alice");
        assert_eq!(&key[..], &[3; 32]);

        assert!(ServerPskCredentials::new().hint_entry().unwrap().is_none());
    }

    #[test]
    fn test_debug_hides_keys() {
        let mut creds = ServerPskCredentials::new().with_hint("alice");
        creds.add_key("alice", Zeroizing::new(vec![0xab; 4]));
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("171"));
        assert!(format!("{:?}", ClientPskCredentials::new("x", Zeroizing::new(vec![1])))
            .contains("static"));
    }
}
