use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use uuid::Uuid;

const TOKEN_BYTES: usize = 32;

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// User identifier.
    pub id: Uuid,
    /// Login email.
    pub email: String,
    /// Name shown on leaderboards.
    pub display_name: String,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    user: CurrentUser,
    expires_at: SystemTime,
}

/// Freshly issued session credentials.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Hex token to send as bearer or cookie.
    pub token: String,
    /// Instant after which the token is refused.
    pub expires_at: SystemTime,
}

/// In-memory map of opaque session tokens to users.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl SessionRegistry {
    /// Empty registry issuing sessions valid for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Lifetime of newly issued sessions.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a session for `user` valid for the configured TTL.
    pub fn issue(&self, user: CurrentUser) -> IssuedSession {
        let token = generate_token();
        let expires_at = SystemTime::now() + self.ttl;
        self.sessions
            .insert(token.clone(), SessionEntry { user, expires_at });
        IssuedSession { token, expires_at }
    }

    /// Look up the user behind `token`; expired sessions are dropped on the way.
    pub fn resolve(&self, token: &str) -> Option<CurrentUser> {
        let now = SystemTime::now();
        let user = {
            let entry = self.sessions.get(token)?;
            (entry.expires_at > now).then(|| entry.user.clone())
        };
        if user.is_none() {
            self.sessions.remove(token);
        }
        user
    }

    /// Forget `token`. Returns whether it was known.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop every expired session, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = SystemTime::now();
        let mut removed = 0;
        self.sessions.retain(|_, entry| {
            let live = entry.expires_at > now;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }
}

/// 256 random bits, hex encoded.
fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}
