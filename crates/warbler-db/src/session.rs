use std::sync::MutexGuard;

use rusqlite::Connection;
use tracing::{debug, warn};
use warbler_types::{Follow, Message, User};

use crate::error::{DbError, Result};
use crate::models::{NewMessage, NewUser, Table};
use crate::queries;

/// A change staged on a session, applied in order on flush.
#[derive(Debug)]
enum Pending {
    User(NewUser),
    Message(NewMessage),
    Follow(Follow),
    Unfollow(Follow),
    DeleteAll(Table),
}

/// A unit of work over the database.
///
/// Writes are staged and only reach SQLite on `flush()`, which also runs
/// before every read. Constraint violations therefore surface from
/// `flush`, `commit`, or a read, never from the call that staged the
/// change. Any failure there rolls back the whole transaction and poisons
/// the session: everything except `rollback()` then returns
/// `DbError::InvalidTransaction`.
///
/// The session holds the connection for its whole lifetime. Dropping it
/// without committing discards all of its changes.
pub struct Session<'db> {
    conn: MutexGuard<'db, Connection>,
    pending: Vec<Pending>,
    poisoned: bool,
}

impl<'db> Session<'db> {
    pub(crate) fn begin(conn: MutexGuard<'db, Connection>) -> Result<Self> {
        if !conn.is_autocommit() {
            warn!("Connection had an open transaction; rolling it back");
            conn.execute_batch("ROLLBACK")?;
        }
        conn.execute_batch("BEGIN")?;

        Ok(Self {
            conn,
            pending: Vec::new(),
            poisoned: false,
        })
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Number of staged changes not yet flushed.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // -- Staging --

    pub fn add_user(&mut self, user: NewUser) -> Result<()> {
        self.stage(Pending::User(user))
    }

    pub fn add_message(&mut self, message: NewMessage) -> Result<()> {
        self.stage(Pending::Message(message))
    }

    /// Stage a follow edge: `follower_id` starts following `followed_id`.
    pub fn follow(&mut self, followed_id: i64, follower_id: i64) -> Result<()> {
        self.stage(Pending::Follow(Follow {
            user_being_followed_id: followed_id,
            user_following_id: follower_id,
        }))
    }

    pub fn unfollow(&mut self, followed_id: i64, follower_id: i64) -> Result<()> {
        self.stage(Pending::Unfollow(Follow {
            user_being_followed_id: followed_id,
            user_following_id: follower_id,
        }))
    }

    /// Bulk-delete every row of `table`. Deleting users cascades to their
    /// messages and follow edges.
    pub fn delete_all(&mut self, table: Table) -> Result<()> {
        self.stage(Pending::DeleteAll(table))
    }

    fn stage(&mut self, change: Pending) -> Result<()> {
        self.ensure_usable()?;
        self.pending.push(change);
        Ok(())
    }

    // -- Transaction control --

    /// Push every staged change to the store inside the open transaction.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_usable()?;
        if self.pending.is_empty() {
            return Ok(());
        }

        let pending = std::mem::take(&mut self.pending);
        debug!(changes = pending.len(), "Flushing session");

        for change in &pending {
            if let Err(err) = apply(&self.conn, change) {
                return Err(self.poison(err));
            }
        }
        Ok(())
    }

    /// Flush, then make the transaction durable. Deferred foreign keys are
    /// checked here. A fresh transaction is opened for further work.
    pub fn commit(&mut self) -> Result<()> {
        self.flush()?;

        if let Err(err) = self.conn.execute_batch("COMMIT") {
            return Err(self.poison(err.into()));
        }
        debug!("Session committed");

        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    /// Discard staged and uncommitted changes and clear the poisoned state.
    pub fn rollback(&mut self) -> Result<()> {
        let discarded = self.pending.len();
        self.pending.clear();

        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        self.conn.execute_batch("BEGIN")?;
        self.poisoned = false;

        debug!(discarded, "Session rolled back");
        Ok(())
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(DbError::InvalidTransaction);
        }
        Ok(())
    }

    fn poison(&mut self, err: DbError) -> DbError {
        if err.is_integrity_violation() {
            warn!(error = %err, "Integrity violation; transaction rolled back");
        } else {
            warn!(error = %err, "Flush failed; transaction rolled back");
        }

        self.pending.clear();
        if !self.conn.is_autocommit() {
            if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %rollback_err, "Rollback after failed flush also failed");
            }
        }
        self.poisoned = true;
        err
    }

    // -- Reads (autoflush) --

    pub fn user_by_username(&mut self, username: &str) -> Result<Option<User>> {
        self.flush()?;
        queries::query_user_by_username(&self.conn, username)
    }

    pub fn user_by_id(&mut self, id: i64) -> Result<Option<User>> {
        self.flush()?;
        queries::query_user_by_id(&self.conn, id)
    }

    pub fn users(&mut self) -> Result<Vec<User>> {
        self.flush()?;
        queries::query_users(&self.conn)
    }

    /// The user's messages in insertion order.
    pub fn messages_for(&mut self, user_id: i64) -> Result<Vec<Message>> {
        self.flush()?;
        queries::query_messages_for(&self.conn, user_id)
    }

    pub fn followers_of(&mut self, user_id: i64) -> Result<Vec<User>> {
        self.flush()?;
        queries::query_followers_of(&self.conn, user_id)
    }

    pub fn following_of(&mut self, user_id: i64) -> Result<Vec<User>> {
        self.flush()?;
        queries::query_following_of(&self.conn, user_id)
    }

    /// Does `user_id` follow `other_id`?
    pub fn is_following(&mut self, user_id: i64, other_id: i64) -> Result<bool> {
        self.flush()?;
        queries::query_follow_exists(
            &self.conn,
            Follow {
                user_being_followed_id: other_id,
                user_following_id: user_id,
            },
        )
    }

    /// Is `user_id` followed by `other_id`?
    pub fn is_followed_by(&mut self, user_id: i64, other_id: i64) -> Result<bool> {
        self.is_following(other_id, user_id)
    }

    pub fn count(&mut self, table: Table) -> Result<usize> {
        self.flush()?;
        queries::query_count(&self.conn, table)
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.conn.is_autocommit() {
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %err, "Rollback on session drop failed");
            }
        }
    }
}

fn apply(conn: &Connection, change: &Pending) -> Result<()> {
    match change {
        Pending::User(user) => {
            let id = queries::insert_user(conn, user)?;
            debug!(id, username = ?user.username, "Inserted user");
        }
        Pending::Message(message) => {
            let id = queries::insert_message(conn, message)?;
            debug!(id, user_id = message.user_id, "Inserted message");
        }
        Pending::Follow(follow) => queries::insert_follow(conn, *follow)?,
        Pending::Unfollow(follow) => {
            if !queries::delete_follow(conn, *follow)? {
                debug!(?follow, "Unfollow of a missing edge");
            }
        }
        Pending::DeleteAll(table) => {
            let removed = queries::delete_all(conn, *table)?;
            debug!(table = table.name(), removed, "Bulk delete");
        }
    }
    Ok(())
}
