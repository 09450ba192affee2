use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use marquee_core::repository::{BoxError, UserRepository};
use marquee_core::user::User;

pub struct StoreUserRepository {
    pool: PgPool,
}

impl StoreUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    image: String,
    favorites: Value,
}

impl UserRow {
    fn into_user(self) -> Result<User, BoxError> {
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            image: self.image,
            favorites: serde_json::from_value(self.favorites)?,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, image, favorites";

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn get(&self, id: &str) -> Result<Option<User>, BoxError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<User>, BoxError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn upsert(&self, user: &User) -> Result<(), BoxError> {
        // Identity events carry no favorites; an update keeps the stored list.
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, image, favorites)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET name = $2, email = $3, image = $4
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image)
        .bind(serde_json::to_value(&user.favorites)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), BoxError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_favorites(&self, id: &str, favorites: &[i64]) -> Result<(), BoxError> {
        sqlx::query("UPDATE users SET favorites = $2 WHERE id = $1")
            .bind(id)
            .bind(serde_json::to_value(favorites)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<User>, BoxError> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn count(&self) -> Result<i64, BoxError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
