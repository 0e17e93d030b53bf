use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder avatar used when a user never uploaded one.
pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";

/// Placeholder profile banner.
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";

/// Maximum length of a message body, in characters.
pub const MAX_MESSAGE_LEN: usize = 140;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    /// Argon2 PHC string for users created through signup. Never serialized.
    #[serde(skip_serializing, default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Directed edge: `user_following_id` follows `user_being_followed_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Follow {
    pub user_being_followed_id: i64,
    pub user_following_id: i64,
}
