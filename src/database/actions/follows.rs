use crate::{
    constants::SUBSCRIPTION_COUNT_PER_PAGE,
    error::{ConflictError, NotFoundError, QueryError},
    pagination::{PageContext, PageQuery},
    schema::{AuthorRead, RecipeMinified, Subscription, SubscriptionRow, Uuid},
};

use super::users::{get_author, get_user_by_id};
use sqlx::{Pool, Postgres};

fn ensure_not_self(user_id: Uuid, author_id: Uuid) -> Result<(), potion::Error> {
    if user_id == author_id {
        return Err(ConflictError::new("You cannot subscribe to yourself").into());
    }
    Ok(())
}

async fn ensure_author_exists(author_id: Uuid, pool: &Pool<Postgres>) -> Result<(), potion::Error> {
    match get_user_by_id(pool, author_id).await? {
        Some(_) => Ok(()),
        None => Err(NotFoundError::new("No user exists with specified id").into()),
    }
}

/// Newest recipes of `author_id`, at most `limit` of them.
pub async fn preview_recipes(
    author_id: Uuid,
    limit: i64,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeMinified>, potion::Error> {
    let rows: Vec<RecipeMinified> = sqlx::query_as(
        "
        SELECT id, title, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY pub_date DESC, id DESC
        LIMIT $2
    ",
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn count_recipes(author_id: Uuid, pool: &Pool<Postgres>) -> Result<i64, potion::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(count)
}

/// Profile card of `author_id` as seen by `viewer_id`.
pub async fn get_subscription(
    author_id: Uuid,
    viewer_id: Uuid,
    recipes_limit: i64,
    pool: &Pool<Postgres>,
) -> Result<Subscription, potion::Error> {
    let author: AuthorRead = get_author(pool, author_id, Some(viewer_id))
        .await?
        .ok_or_else(|| NotFoundError::new("No user exists with specified id"))?;
    let recipes = preview_recipes(author_id, recipes_limit, pool).await?;
    let recipes_count = count_recipes(author_id, pool).await?;

    Ok(Subscription::new(author, recipes, recipes_count))
}

pub async fn follow_author(
    user_id: Uuid,
    author_id: Uuid,
    recipes_limit: i64,
    pool: &Pool<Postgres>,
) -> Result<Subscription, potion::Error> {
    ensure_not_self(user_id, author_id)?;
    ensure_author_exists(author_id, pool).await?;

    let result = sqlx::query(
        "INSERT INTO follows (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ConflictError::new("You are already subscribed to this author").into());
    }

    get_subscription(author_id, user_id, recipes_limit, pool).await
}

pub async fn unfollow_author(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    ensure_not_self(user_id, author_id)?;
    ensure_author_exists(author_id, pool).await?;

    let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(NotFoundError::new("You are not subscribed to this author").into());
    }

    Ok(())
}

/// Authors followed by `user_id`, most recent follow first. `is_subscribed`
/// is computed against `user_id` like anywhere else.
pub async fn fetch_subscriptions(
    user_id: Uuid,
    query: &PageQuery,
    base_url: &str,
    pool: &Pool<Postgres>,
) -> Result<PageContext<Subscription>, potion::Error> {
    let limit = query.page_size(SUBSCRIPTION_COUNT_PER_PAGE);

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    let rows: Vec<SubscriptionRow> = sqlx::query_as(
        "
        SELECT u.email, u.id, u.username, u.first_name, u.last_name, u.avatar,
            EXISTS (
                SELECT 1 FROM follows s WHERE s.user_id = $1 AND s.author_id = u.id
            ) AS is_subscribed,
            (SELECT COUNT(*) FROM recipes r WHERE r.author_id = u.id) AS recipes_count
        FROM follows f
        INNER JOIN users u ON u.id = f.author_id
        WHERE f.user_id = $1
        ORDER BY f.created_at DESC, u.id DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(limit)
    .bind(query.offset(SUBSCRIPTION_COUNT_PER_PAGE))
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let recipes_limit = query.recipes_limit();
    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        let recipes = preview_recipes(row.author.id, recipes_limit, pool).await?;
        results.push(Subscription::new(row.author, recipes, row.recipes_count));
    }

    Ok(PageContext::from_rows(
        results,
        total,
        query.page(),
        limit,
        &format!("{base_url}?recipes_limit={recipes_limit}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_follow_is_rejected_without_a_store() {
        let err = ensure_not_self(4, 4).unwrap_err();
        assert_eq!(err.code as u16, 400);

        assert!(ensure_not_self(4, 5).is_ok());
    }
}
