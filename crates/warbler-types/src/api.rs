use serde::Serialize;

use crate::models::{Message, User};

// -- Profiles --

/// A user together with the sizes of its relationships, as shown by
/// `warbler show`.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: User,
    pub message_count: usize,
    pub follower_count: usize,
    pub following_count: usize,
    pub latest_message: Option<Message>,
}
