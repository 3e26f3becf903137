//! User fixture repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Insert users, detail rows and skill rows for scenarios and demos.
//! - Clear all user tables between scenarios.
//!
//! # Invariants
//! - Child rows are only written for an existing user.
//! - Names and cities must not be blank.
//! - Nothing here cascades; each call touches exactly the rows it names.

use crate::db::DbError;
use crate::model::user::{DetailId, SkillId, UserId};
use log::debug;
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for fixture writes.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    UserNotFound(UserId),
    BlankValue(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::BlankValue(field) => write!(f, "{field} must not be blank"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UserNotFound(_) | Self::BlankValue(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Write-side repository for the user tables.
pub trait UserRepository {
    fn create_user(&self, name: &str) -> RepoResult<UserId>;
    fn create_detail(&self, user_id: UserId, city: &str, active: bool) -> RepoResult<DetailId>;
    fn create_skill(&self, user_id: UserId, skill_name: &str, deleted: bool)
        -> RepoResult<SkillId>;
    fn count_users(&self) -> RepoResult<u64>;
    /// Deletes every skill, detail and user row, children first.
    fn delete_all(&self) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn ensure_user_exists(&self, user_id: UserId) -> RepoResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?1);",
            [user_id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::UserNotFound(user_id));
        }
        Ok(())
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, name: &str) -> RepoResult<UserId> {
        let name = non_blank(name, "user name")?;
        self.conn
            .execute("INSERT INTO users (user_name) VALUES (?1);", [name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn create_detail(&self, user_id: UserId, city: &str, active: bool) -> RepoResult<DetailId> {
        let city = non_blank(city, "city")?;
        self.ensure_user_exists(user_id)?;
        self.conn.execute(
            "INSERT INTO user_details (city, is_active, user_id) VALUES (?1, ?2, ?3);",
            params![city, active, user_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn create_skill(
        &self,
        user_id: UserId,
        skill_name: &str,
        deleted: bool,
    ) -> RepoResult<SkillId> {
        let skill_name = non_blank(skill_name, "skill name")?;
        self.ensure_user_exists(user_id)?;
        self.conn.execute(
            "INSERT INTO user_skills (skill_name, has_deleted, user_id) VALUES (?1, ?2, ?3);",
            params![skill_name, deleted, user_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn count_users(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn delete_all(&self) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let skills = tx.execute("DELETE FROM user_skills;", [])?;
        let details = tx.execute("DELETE FROM user_details;", [])?;
        let users = tx.execute("DELETE FROM users;", [])?;
        tx.commit()?;
        debug!(
            "event=fixtures_cleared module=repo status=ok users={users} details={details} skills={skills}"
        );
        Ok(())
    }
}

/// Rejects whitespace-only input; accepted values are stored verbatim so
/// name lookups match what the caller wrote.
fn non_blank<'v>(value: &'v str, field: &'static str) -> RepoResult<&'v str> {
    if value.trim().is_empty() {
        return Err(RepoError::BlankValue(field));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{RepoError, SqliteUserRepository, UserRepository};
    use crate::db::open_db_in_memory;

    #[test]
    fn values_are_stored_verbatim() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteUserRepository::new(&conn);
        let user_id = repo.create_user(" Alice ").unwrap();

        let stored: String = conn
            .query_row(
                "SELECT user_name FROM users WHERE user_id = ?1;",
                [user_id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, " Alice ");
    }

    #[test]
    fn delete_all_clears_children_before_users() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteUserRepository::new(&conn);
        let user_id = repo.create_user("Judy").unwrap();
        repo.create_detail(user_id, "Porto", true).unwrap();
        repo.create_skill(user_id, "Zig", false).unwrap();

        repo.delete_all().unwrap();
        assert_eq!(repo.count_users().unwrap(), 0);
        let skills: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_skills;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(skills, 0);
    }

    #[test]
    fn blank_skill_name_is_rejected_before_user_check() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteUserRepository::new(&conn);
        let err = repo.create_skill(1, "\t ", true).unwrap_err();
        assert!(matches!(err, RepoError::BlankValue("skill name")));
    }
}
