use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use warbler_types::{Follow, Message, User};

use crate::error::Result;
use crate::models::{NewMessage, NewUser, Table};

const USER_COLUMNS: &str =
    "u.id, u.email, u.username, u.image_url, u.header_image_url, u.bio, u.location, u.password";

// -- Writes --

pub(crate) fn insert_user(conn: &Connection, user: &NewUser) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (email, username, password, image_url, header_image_url, bio, location)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            user.email,
            user.username,
            user.password,
            user.image_url,
            user.header_image_url,
            user.bio,
            user.location,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_message(conn: &Connection, message: &NewMessage) -> Result<i64> {
    conn.execute(
        "INSERT INTO messages (user_id, text, timestamp) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            message.user_id,
            message.text,
            message.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_follow(conn: &Connection, follow: Follow) -> Result<()> {
    conn.execute(
        "INSERT INTO follows (user_being_followed_id, user_following_id) VALUES (?1, ?2)",
        (follow.user_being_followed_id, follow.user_following_id),
    )?;
    Ok(())
}

/// Returns whether an edge was actually removed.
pub(crate) fn delete_follow(conn: &Connection, follow: Follow) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
        (follow.user_being_followed_id, follow.user_following_id),
    )?;
    Ok(removed > 0)
}

pub(crate) fn delete_all(conn: &Connection, table: Table) -> Result<usize> {
    let removed = conn.execute(&format!("DELETE FROM {}", table.name()), [])?;
    Ok(removed)
}

// -- Reads --

pub(crate) fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1"
    ))?;
    let user = stmt.query_row([username], user_from_row).optional()?;
    Ok(user)
}

pub(crate) fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"))?;
    let user = stmt.query_row([id], user_from_row).optional()?;
    Ok(user)
}

pub(crate) fn query_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users u ORDER BY u.id"))?;
    let users = stmt
        .query_map([], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Messages owned by `user_id`, oldest first.
pub(crate) fn query_messages_for(conn: &Connection, user_id: i64) -> Result<Vec<Message>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, text, timestamp FROM messages WHERE user_id = ?1 ORDER BY id",
    )?;
    let messages = stmt
        .query_map([user_id], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(messages)
}

/// Users following `user_id`.
pub(crate) fn query_followers_of(conn: &Connection, user_id: i64) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS}
         FROM follows f
         JOIN users u ON u.id = f.user_following_id
         WHERE f.user_being_followed_id = ?1
         ORDER BY u.id"
    ))?;
    let users = stmt
        .query_map([user_id], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Users that `user_id` follows.
pub(crate) fn query_following_of(conn: &Connection, user_id: i64) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS}
         FROM follows f
         JOIN users u ON u.id = f.user_being_followed_id
         WHERE f.user_following_id = ?1
         ORDER BY u.id"
    ))?;
    let users = stmt
        .query_map([user_id], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(users)
}

pub(crate) fn query_follow_exists(conn: &Connection, follow: Follow) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2
         )",
        (follow.user_being_followed_id, follow.user_following_id),
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub(crate) fn query_count(conn: &Connection, table: Table) -> Result<usize> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table.name()), [], |row| {
        row.get(0)
    })?;
    Ok(count as usize)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        image_url: row.get(3)?,
        header_image_url: row.get(4)?,
        bio: row.get(5)?,
        location: row.get(6)?,
        password: row.get(7)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let raw: String = row.get(3)?;
    let timestamp = DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(Message {
        id: row.get(0)?,
        user_id: row.get(1)?,
        text: row.get(2)?,
        timestamp,
    })
}
