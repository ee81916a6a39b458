//! Local identity for the social layer.

use std::sync::Arc;

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MirrorError, Result};
use crate::mirror::RemoteMirror;
use crate::storage::{Persisted, StateStore};

pub const USER_KEY: &str = "onething-user";

/// Unambiguous alphabet: no I, O, 0 or 1.
pub const FRIEND_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const FRIEND_CODE_LEN: usize = 6;

pub fn generate_friend_code(rng: &mut dyn RngCore) -> String {
    (0..FRIEND_CODE_LEN)
        .map(|_| FRIEND_CODE_ALPHABET[rng.gen_range(0..FRIEND_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Normalize user input; `None` unless it could be a friend code.
pub fn parse_friend_code(input: &str) -> Option<String> {
    let code = input.trim().to_ascii_uppercase();
    (code.len() == FRIEND_CODE_LEN && code.bytes().all(|b| FRIEND_CODE_ALPHABET.contains(&b)))
        .then_some(code)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Option<String>,
    pub nickname: Option<String>,
    pub friend_code: Option<String>,
    /// Last friend count seen on the mirror.
    #[serde(default)]
    pub friend_count: u32,
}

impl UserProfile {
    pub fn is_registered(&self) -> bool {
        self.user_id.is_some() && self.nickname.is_some()
    }
}

pub struct ProfileStore {
    state: Persisted<UserProfile>,
    rng: Box<dyn RngCore + Send>,
}

impl ProfileStore {
    pub fn new(backend: Arc<dyn StateStore>) -> Self {
        Self::with_rng(backend, Box::new(Pcg64::from_entropy()))
    }

    pub fn with_rng(backend: Arc<dyn StateStore>, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            state: Persisted::new(USER_KEY, backend),
            rng,
        }
    }

    pub fn hydrate(&mut self) -> Result<()> {
        self.state.hydrate()
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.is_hydrated()
    }

    pub fn profile(&self) -> Result<&UserProfile> {
        self.state.get()
    }

    pub fn is_registered(&self) -> Result<bool> {
        Ok(self.state.get()?.is_registered())
    }

    /// Registered user id, if any.
    pub fn user_id(&self) -> Result<Option<&str>> {
        let p = self.state.get()?;
        Ok(if p.is_registered() {
            p.user_id.as_deref()
        } else {
            None
        })
    }

    pub fn set_friend_count(&mut self, count: u32) -> Result<()> {
        self.state.update(|p| p.friend_count = count)
    }

    /// Create a remote profile under a fresh friend code.
    ///
    /// A code collision is retried once with a new code. Any other mirror
    /// failure is logged and reported as `false`; local state is only written
    /// on success.
    pub async fn register(&mut self, mirror: &dyn RemoteMirror, nickname: &str) -> Result<bool> {
        let nickname = nickname.trim();
        if nickname.is_empty() || self.is_registered()? {
            return Ok(false);
        }

        let mut code = generate_friend_code(self.rng.as_mut());
        let mut outcome = mirror.register_profile(nickname, &code).await;
        if let Err(MirrorError::Duplicate(_)) = outcome {
            code = generate_friend_code(self.rng.as_mut());
            outcome = mirror.register_profile(nickname, &code).await;
        }

        let remote = match outcome {
            Ok(remote) => remote,
            Err(e) => {
                warn!(error = %e, "profile registration failed");
                return Ok(false);
            }
        };

        let friend_code = remote.friend_code.unwrap_or(code);
        info!(user_id = %remote.id, "profile registered");
        self.state.update(|p| {
            p.user_id = Some(remote.id);
            p.nickname = Some(nickname.to_string());
            p.friend_code = Some(friend_code);
        })?;
        Ok(true)
    }
}
