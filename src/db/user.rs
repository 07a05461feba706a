//! User records and the identity key-rotation history.

use serde::{Deserialize, Serialize};

/// Size in bytes of an identity public key (Ed25519).
pub const PUBLIC_KEY_SIZE: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;

/// An identity public key.
pub type PublicKey = [u8; PUBLIC_KEY_SIZE];

/// A public key plus the timestamps bounding its service life.
///
/// A zero `activated` means the key was never put into service; a
/// non-zero `deactivated` means it has been superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub key: PublicKey,
    /// Time the key was activated for use.
    pub activated: i64,
    /// Time the key was deactivated.
    pub deactivated: i64,
}

impl Identity {
    /// True while the key is in service.
    pub fn is_active(&self) -> bool {
        self.activated != 0 && self.deactivated == 0
    }
}

/// Return the current active key among `identities`.
///
/// A user should hold at most one active key at a time; if a misbehaving
/// backend hands back more, the first in sequence order wins.
pub fn active_identity(identities: &[Identity]) -> Option<PublicKey> {
    identities.iter().find(|id| id.is_active()).map(|id| id.key)
}

/// Hex-encoded form of [`active_identity`].
pub fn active_identity_hex(identities: &[Identity]) -> Option<String> {
    active_identity(identities).map(hex::encode)
}

/// User record.
///
/// `identities` holds every key the user has ever used, oldest first;
/// entries are never reordered or pruned, so key loss stays recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique id.
    pub id: u64,
    /// Email address, also the primary lookup key.
    pub email: String,
    /// Unique username.
    pub username: String,
    /// Password hash.
    pub hashed_password: Vec<u8>,
    /// Administrator flag.
    pub admin: bool,
    /// Verification token issued at signup, while outstanding.
    pub register_verification_token: Option<Vec<u8>>,
    /// Expiry of the signup token.
    pub register_verification_expiry: i64,
    /// Verification token issued when rotating to a new identity.
    pub update_identity_verification_token: Option<Vec<u8>>,
    /// Expiry of the identity-update token.
    pub update_identity_verification_expiry: i64,
    /// Unix timestamp of the last successful login.
    pub last_login: i64,
    /// Consecutive failed login attempts.
    pub failed_login_attempts: u64,
    /// Full key-rotation history.
    pub identities: Vec<Identity>,
}

impl User {
    /// Record a successful login.
    pub fn record_login(&mut self, now: i64) {
        self.last_login = now;
        self.failed_login_attempts = 0;
    }

    /// Record a failed login attempt.
    pub fn record_failed_login(&mut self) {
        self.failed_login_attempts += 1;
    }

    /// Complete signup verification: clear the registration token and
    /// put the first identity into service.
    pub fn verify_registration(&mut self, now: i64) {
        self.register_verification_token = None;
        self.register_verification_expiry = 0;
        if let Some(first) = self.identities.first_mut() {
            first.activated = now;
            first.deactivated = 0;
        }
    }

    /// Rotate to a new key: deactivate whichever key is in service and
    /// append the new one, activated. Keeps at most one key active.
    pub fn rotate_identity(&mut self, key: PublicKey, now: i64) {
        self.update_identity_verification_token = None;
        self.update_identity_verification_expiry = 0;
        for id in &mut self.identities {
            if id.is_active() {
                id.deactivated = now;
            }
        }
        self.identities.push(Identity {
            key,
            activated: now,
            deactivated: 0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(fill: u8) -> PublicKey {
        [fill; PUBLIC_KEY_SIZE]
    }

    fn sample_user() -> User {
        User {
            id: 1,
            email: "user@example.com".into(),
            username: "user".into(),
            hashed_password: vec![0xaa; 16],
            admin: false,
            register_verification_token: Some(vec![1, 2, 3]),
            register_verification_expiry: 1_000,
            update_identity_verification_token: None,
            update_identity_verification_expiry: 0,
            last_login: 0,
            failed_login_attempts: 0,
            identities: vec![Identity {
                key: key(1),
                activated: 0,
                deactivated: 0,
            }],
        }
    }

    #[test]
    fn is_active_truth_table() {
        let cases = [
            (0, 0, false),
            (10, 0, true),
            (0, 20, false),
            (10, 20, false),
        ];
        for (activated, deactivated, want) in cases {
            let id = Identity {
                key: key(0),
                activated,
                deactivated,
            };
            assert_eq!(id.is_active(), want, "activated={activated} deactivated={deactivated}");
        }
    }

    #[test]
    fn active_identity_empty_sequence() {
        assert_eq!(active_identity(&[]), None);
    }

    #[test]
    fn active_identity_none_when_all_deactivated() {
        let ids = [
            Identity { key: key(1), activated: 10, deactivated: 20 },
            Identity { key: key(2), activated: 20, deactivated: 30 },
        ];
        assert_eq!(active_identity(&ids), None);
        assert_eq!(active_identity_hex(&ids), None);
    }

    #[test]
    fn active_identity_skips_inactive_entries() {
        let ids = [
            Identity { key: key(1), activated: 10, deactivated: 20 },
            Identity { key: key(2), activated: 20, deactivated: 0 },
        ];
        assert_eq!(active_identity(&ids), Some(key(2)));
    }

    #[test]
    fn active_identity_first_wins_when_invariant_violated() {
        // A buggy backend may hand back two active keys; the first in
        // sequence order must win for compatibility.
        let ids = [
            Identity { key: key(1), activated: 10, deactivated: 0 },
            Identity { key: key(2), activated: 20, deactivated: 0 },
        ];
        assert_eq!(active_identity(&ids), Some(key(1)));
    }

    #[test]
    fn active_identity_hex_encodes_key() {
        let ids = [Identity { key: key(0xab), activated: 5, deactivated: 0 }];
        assert_eq!(
            active_identity_hex(&ids).unwrap(),
            "ab".repeat(PUBLIC_KEY_SIZE)
        );
    }

    #[test]
    fn record_login_resets_failure_counter() {
        let mut user = sample_user();
        user.record_failed_login();
        user.record_failed_login();
        assert_eq!(user.failed_login_attempts, 2);

        user.record_login(500);
        assert_eq!(user.last_login, 500);
        assert_eq!(user.failed_login_attempts, 0);
    }

    #[test]
    fn verify_registration_activates_first_identity() {
        let mut user = sample_user();
        user.verify_registration(100);
        assert_eq!(user.register_verification_token, None);
        assert_eq!(user.register_verification_expiry, 0);
        assert_eq!(active_identity(&user.identities), Some(key(1)));
    }

    #[test]
    fn verify_registration_without_identities() {
        let mut user = sample_user();
        user.identities.clear();
        user.verify_registration(100);
        assert_eq!(user.register_verification_token, None);
        assert_eq!(active_identity(&user.identities), None);
    }

    #[test]
    fn rotation_keeps_at_most_one_active() {
        let mut user = sample_user();
        user.verify_registration(100);
        user.rotate_identity(key(2), 200);
        user.rotate_identity(key(3), 300);

        assert_eq!(user.identities.len(), 3);
        let active: Vec<_> = user
            .identities
            .iter()
            .filter(|id| id.is_active())
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active_identity(&user.identities), Some(key(3)));

        // History preserved, oldest first.
        assert_eq!(user.identities[0].key, key(1));
        assert_eq!(user.identities[0].deactivated, 200);
        assert_eq!(user.identities[1].key, key(2));
        assert_eq!(user.identities[1].deactivated, 300);
    }
}
