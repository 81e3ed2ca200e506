use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::Engine;
use parking_lot::RwLock;
use tracing::debug;

use super::principal::{Principal, Role};

pub type SessionId = String;

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: SessionId,
    pub principal: Principal,
    pub issued_at: Instant,
    pub last_seen: Instant,
    /// One-shot messages shown by the next rendered page.
    pub flash: Vec<String>,
}

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

fn gen_id() -> Result<SessionId, getrandom::Error> {
    // 256-bit random token base64url without padding
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf)?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// Server-side session table, keyed by the id carried in the session cookie.
#[derive(Debug)]
pub struct SessionManager {
    /// Idle lifetime. A session unused for longer is gone.
    pub ttl: Duration,
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl Default for SessionManager {
    fn default() -> Self { Self::new(DEFAULT_SESSION_TTL) }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, sessions: RwLock::new(HashMap::new()) }
    }

    /// Start a fresh session. A new id is minted on every login, and idle
    /// sessions are pruned on the way in.
    pub fn issue(&self, principal: Principal) -> Result<Session, getrandom::Error> {
        let now = Instant::now();
        let sess = Session {
            session_id: gen_id()?,
            principal,
            issued_at: now,
            last_seen: now,
            flash: Vec::new(),
        };
        let mut map = self.sessions.write();
        let before = map.len();
        map.retain(|_, s| now.duration_since(s.last_seen) <= self.ttl);
        let pruned = before - map.len();
        map.insert(sess.session_id.clone(), sess.clone());
        drop(map);
        if pruned > 0 {
            debug!(target: "certportal::session", "pruned {} idle sessions", pruned);
        }
        debug!(target: "certportal::session", "session.issue role={} email={}", sess.principal.role, sess.principal.email);
        Ok(sess)
    }

    /// Look up the principal for a session id, refreshing its idle timer.
    pub fn validate(&self, sid: &str) -> Option<Principal> {
        let now = Instant::now();
        let mut map = self.sessions.write();
        let expired = match map.get_mut(sid) {
            None => return None,
            Some(sess) if now.duration_since(sess.last_seen) > self.ttl => true,
            Some(sess) => {
                sess.last_seen = now;
                return Some(sess.principal.clone());
            }
        };
        if expired {
            map.remove(sid);
        }
        None
    }

    pub fn push_flash(&self, sid: &str, message: impl Into<String>) {
        if let Some(sess) = self.sessions.write().get_mut(sid) {
            sess.flash.push(message.into());
        }
    }

    pub fn take_flash(&self, sid: &str) -> Vec<String> {
        self.sessions
            .write()
            .get_mut(sid)
            .map(|s| std::mem::take(&mut s.flash))
            .unwrap_or_default()
    }

    /// Drop the whole session. Returns false when there was none.
    pub fn logout(&self, sid: &str) -> bool {
        self.sessions.write().remove(sid).is_some()
    }

    /// Drop every session held by this account, e.g. after it was renamed
    /// or deleted. Returns how many were removed.
    pub fn revoke_email(&self, role: Role, email: &str) -> usize {
        let mut map = self.sessions.write();
        let before = map.len();
        map.retain(|_, s| !(s.principal.role == role && s.principal.email == email));
        before - map.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
