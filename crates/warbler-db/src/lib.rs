pub mod error;
pub mod migrations;
pub mod models;
mod queries;
pub mod session;


use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub use error::{Constraint, DbError, Result};
pub use models::{NewMessage, NewUser, Table};
pub use session::Session;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent readers from other processes
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self::init(Connection::open_in_memory()?)?;
        info!("In-memory database opened");
        Ok(db)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Start a unit of work. Blocks while another session is open.
    pub fn session(&self) -> Result<Session<'_>> {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        Session::begin(conn)
    }

    /// Run `f` in a fresh session, committing if it returns `Ok` and rolling
    /// back otherwise.
    pub fn transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Session<'_>) -> std::result::Result<T, E>,
        E: From<DbError>,
    {
        let mut session = self.session()?;
        match f(&mut session) {
            Ok(value) => {
                session.commit()?;
                Ok(value)
            }
            Err(err) => {
                session.rollback()?;
                Err(err)
            }
        }
    }

    /// Raw access to the connection, outside any session.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&conn)
    }
}
