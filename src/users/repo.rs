use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::{
    error::{UserError, UserResult},
    model::User,
};

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.number) * u64::from(self.size)
    }
}

/// One slice of a listing plus the totals needed to navigate the rest.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub request: PageRequest,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.request.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.request.size))
    }
}

/// Persistence for users. Implementations assign `id` on insert and keep
/// `email` unique atomically.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_all(&self, page: PageRequest) -> UserResult<Page<User>>;

    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Inserts when `user.id` is `None`, otherwise replaces the stored record.
    /// Replacing an unknown id yields `UserError::NotFound`.
    async fn save(&self, user: User) -> UserResult<User>;

    /// Returns whether a record was removed.
    async fn delete_by_id(&self, id: i64) -> UserResult<bool>;

    async fn delete_all(&self) -> UserResult<u64>;
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    firstname: String,
    lastname: String,
    email: String,
    password: String,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User::with_id(r.id, r.firstname, r.lastname, r.email, r.password)
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_err(err: sqlx::Error, email: &str) -> UserError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            UserError::DuplicateEmail(email.to_string())
        }
        _ => UserError::Internal(anyhow::Error::new(err).context("write user")),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_all(&self, page: PageRequest) -> UserResult<Page<User>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await
            .context("count users")?;

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, firstname, lastname, email, password
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(page.size))
        .bind(page.offset() as i64)
        .fetch_all(&self.db)
        .await
        .context("list users")?;

        Ok(Page {
            content: rows.into_iter().map(User::from).collect(),
            request: page,
            total_elements: total.max(0) as u64,
        })
    }

    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, firstname, lastname, email, password
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, firstname, lastname, email, password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(row.map(User::from))
    }

    async fn save(&self, user: User) -> UserResult<User> {
        let row = match user.id {
            None => sqlx::query_as::<_, UserRow>(
                r#"
                INSERT INTO users (firstname, lastname, email, password)
                VALUES ($1, $2, $3, $4)
                RETURNING id, firstname, lastname, email, password
                "#,
            )
            .bind(&user.firstname)
            .bind(&user.lastname)
            .bind(&user.email)
            .bind(&user.password)
            .fetch_one(&self.db)
            .await
            .map_err(|e| map_write_err(e, &user.email))?,
            Some(id) => sqlx::query_as::<_, UserRow>(
                r#"
                UPDATE users
                SET firstname = $2, lastname = $3, email = $4, password = $5
                WHERE id = $1
                RETURNING id, firstname, lastname, email, password
                "#,
            )
            .bind(id)
            .bind(&user.firstname)
            .bind(&user.lastname)
            .bind(&user.email)
            .bind(&user.password)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| map_write_err(e, &user.email))?
            .ok_or(UserError::NotFound(id))?,
        };
        Ok(row.into())
    }

    async fn delete_by_id(&self, id: i64) -> UserResult<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_all(&self) -> UserResult<u64> {
        let res = sqlx::query("DELETE FROM users")
            .execute(&self.db)
            .await
            .context("delete all users")?;
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(total: u64, size: u32) -> Page<User> {
        Page {
            content: Vec::new(),
            request: PageRequest { number: 0, size },
            total_elements: total,
        }
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(page_of(0, 20).total_pages(), 0);
        assert_eq!(page_of(1, 20).total_pages(), 1);
        assert_eq!(page_of(20, 20).total_pages(), 1);
        assert_eq!(page_of(21, 20).total_pages(), 2);
        assert_eq!(page_of(5, 0).total_pages(), 0);
    }

    #[test]
    fn offset_scales_with_page_number() {
        let req = PageRequest { number: 3, size: 25 };
        assert_eq!(req.offset(), 75);
    }
}
