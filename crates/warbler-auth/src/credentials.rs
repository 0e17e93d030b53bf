use tracing::debug;
use warbler_db::{NewUser, Session};
use warbler_types::User;

use crate::error::AuthError;
use crate::hasher::{Hasher, HashingConfig};

/// Hashed at construction and verified against whenever a login names an
/// unknown user, so both failure paths do the same Argon2 work.
const DUMMY_PASSWORD: &str = "warbler-no-such-user";

/// Signup and login in front of the `users` table.
pub struct CredentialManager {
    hasher: Hasher,
    dummy_hash: String,
}

impl CredentialManager {
    pub fn new(config: HashingConfig) -> Result<Self, AuthError> {
        let hasher = Hasher::new(config)?;
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self { hasher, dummy_hash })
    }

    /// Hash `password` and stage a new user on `session`.
    ///
    /// Nothing is written until the session flushes, so a duplicate or
    /// missing email/username is reported by `commit()`, not here. A missing
    /// `image_url` falls back to the placeholder avatar.
    pub fn signup(
        &self,
        session: &mut Session<'_>,
        email: Option<&str>,
        username: Option<&str>,
        password: &str,
        image_url: Option<&str>,
    ) -> Result<NewUser, AuthError> {
        let hashed = self.hasher.hash(password)?;

        let user = NewUser::from_optional(
            email.map(str::to_string),
            username.map(str::to_string),
            hashed,
        )
        .with_image_url(image_url);

        session.add_user(user.clone())?;
        debug!(username = ?user.username, "Signup staged");
        Ok(user)
    }

    /// Returns the user when `password` matches their stored hash.
    ///
    /// An unknown username and a wrong password both give `Ok(None)`; callers
    /// cannot tell them apart. `Err` is reserved for store failures.
    pub fn authenticate(
        &self,
        session: &mut Session<'_>,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AuthError> {
        let user = session.user_by_username(username)?;

        let (matched, user) = match user {
            Some(user) => (self.hasher.verify(password, &user.password), Some(user)),
            None => {
                self.hasher.verify(password, &self.dummy_hash);
                (false, None)
            }
        };

        if matched {
            debug!(username, "Authentication succeeded");
            Ok(user)
        } else {
            debug!(username, "Authentication failed");
            Ok(None)
        }
    }
}
