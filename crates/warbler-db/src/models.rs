//! Insertable records. These are what a `Session` stages; the store assigns
//! ids and enforces constraints when they are flushed.

use chrono::{DateTime, Utc};
use warbler_types::{DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL};

/// A user that has not been written yet.
///
/// `email` and `username` are optional on purpose: a missing value is
/// rejected by the NOT NULL constraints at flush time, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl NewUser {
    /// Build a user directly. `password` is stored as given, with no hashing.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::from_optional(Some(email.into()), Some(username.into()), password)
    }

    /// Like `new`, but either identity field may be missing.
    pub fn from_optional(
        email: Option<String>,
        username: Option<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email,
            username,
            password: password.into(),
            image_url: DEFAULT_IMAGE_URL.to_string(),
            header_image_url: DEFAULT_HEADER_IMAGE_URL.to_string(),
            bio: None,
            location: None,
        }
    }

    /// `None` keeps the placeholder avatar.
    pub fn with_image_url(mut self, image_url: Option<&str>) -> Self {
        self.image_url = image_url.unwrap_or(DEFAULT_IMAGE_URL).to_string();
        self
    }

    pub fn with_header_image_url(mut self, header_image_url: Option<&str>) -> Self {
        self.header_image_url = header_image_url
            .unwrap_or(DEFAULT_HEADER_IMAGE_URL)
            .to_string();
        self
    }

    pub fn with_bio(mut self, bio: Option<&str>) -> Self {
        self.bio = bio.map(str::to_string);
        self
    }

    pub fn with_location(mut self, location: Option<&str>) -> Self {
        self.location = location.map(str::to_string);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub user_id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl NewMessage {
    pub fn new(user_id: i64, text: impl Into<String>) -> Self {
        Self {
            user_id,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Tables that can be bulk-deleted or counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Messages,
    Follows,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Messages => "messages",
            Table::Follows => "follows",
        }
    }
}
