use crate::{
    authentication::cryptography::hash_password,
    error::{ConflictError, QueryError, TypeError},
    schema::{AuthorRead, NewUser, User, Uuid},
};

use sqlx::{Pool, Postgres};

pub async fn get_user_by_id(
    pool: &Pool<Postgres>,
    user_id: Uuid,
) -> Result<Option<User>, potion::Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Profile of `author_id` as seen by `viewer_id`; anonymous viewers are
/// never subscribed.
pub async fn get_author(
    pool: &Pool<Postgres>,
    author_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<Option<AuthorRead>, potion::Error> {
    let row: Option<AuthorRead> = sqlx::query_as(
        "
        SELECT u.email, u.id, u.username, u.first_name, u.last_name, u.avatar,
            EXISTS (
                SELECT 1 FROM follows f WHERE f.user_id = $2 AND f.author_id = u.id
            ) AS is_subscribed
        FROM users u
        WHERE u.id = $1
    ",
    )
    .bind(author_id)
    .bind(viewer_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row)
}

fn validate_new_user(user: &NewUser) -> Result<(), TypeError> {
    let email = user.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(TypeError::new("email", "Enter a valid email address")),
    }

    if user.username.trim().is_empty() {
        return Err(TypeError::new("username", "This field may not be blank"));
    }
    if user.password.is_empty() {
        return Err(TypeError::new("password", "This field may not be blank"));
    }

    Ok(())
}

/// Stores a new account with an argon2 hash of its password.
pub async fn create_user(user: NewUser, pool: &Pool<Postgres>) -> Result<User, potion::Error> {
    validate_new_user(&user)?;

    let password =
        hash_password(&user.password).map_err(|e| QueryError::new(format!("{e}")))?;

    let row: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(user.email.trim())
    .bind(user.username.trim())
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(password)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    match row {
        Some(user) => {
            log::info!("Registered user {} ({})", user.id, user.email);
            Ok(user)
        }
        None => Err(ConflictError::new("A user with that email or username already exists").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, username: &str, password: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password: password.to_string(),
        }
    }

    #[test]
    fn validates_registration_fields() {
        assert!(validate_new_user(&new_user("a@b.io", "alice", "pw")).is_ok());

        assert_eq!(
            validate_new_user(&new_user("not-an-email", "alice", "pw"))
                .unwrap_err()
                .field(),
            "email"
        );
        assert_eq!(
            validate_new_user(&new_user("a@b.io", "  ", "pw"))
                .unwrap_err()
                .field(),
            "username"
        );
        assert_eq!(
            validate_new_user(&new_user("a@b.io", "alice", ""))
                .unwrap_err()
                .field(),
            "password"
        );
    }
}
