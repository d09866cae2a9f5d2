use crate::{
    authentication::permissions::ActionType,
    constants::{RECIPE_COUNT_PER_PAGE, SHORT_ID_ATTEMPTS, SHORT_LINK_PREFIX},
    error::{NotFoundError, QueryError, TypeError},
    form::{CompositionWrite, RecipePatch, RecipeWrite},
    jwt::SessionData,
    pagination::{PageContext, PageQuery},
    schema::{Composition, Recipe, RecipeRead, ShortId, ShortLink, Uuid},
};

use super::users::get_author;
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

/// Newest recipes first, rendered for `viewer`.
pub async fn fetch_recipes(
    query: &PageQuery,
    viewer: Option<&SessionData>,
    base_url: &str,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRead>, potion::Error> {
    let limit = query.page_size(RECIPE_COUNT_PER_PAGE);

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    let rows: Vec<Recipe> =
        sqlx::query_as("SELECT * FROM recipes ORDER BY pub_date DESC, id DESC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(query.offset(RECIPE_COUNT_PER_PAGE))
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    let mut results = Vec::with_capacity(rows.len());
    for recipe in rows {
        results.push(read_recipe(recipe, viewer, pool).await?);
    }

    Ok(PageContext::from_rows(
        results,
        total,
        query.page(),
        limit,
        base_url,
    ))
}

pub async fn list_compositions(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<Composition>, potion::Error> {
    let rows: Vec<Composition> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.unit AS unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, potion::Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_recipe_by_short_id(
    short_id: ShortId,
    pool: &Pool<Postgres>,
) -> Result<Option<Recipe>, potion::Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE short_id = $1")
        .bind(short_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Loads a recipe the caller is about to change; only its author gets it.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, potion::Error> {
    match get_recipe(id, pool).await? {
        Some(recipe) => {
            session.authenticate(ActionType::ManageOwnRecipes, recipe.author_id)?;
            Ok(recipe)
        }
        None => Err(NotFoundError::new("No recipe exists with specified id").into()),
    }
}

/// Favorite/cart flags of `recipe_id` for `viewer`; both false when anonymous.
pub async fn get_recipe_flags(
    recipe_id: Uuid,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<(bool, bool), potion::Error> {
    let viewer = match viewer {
        Some(viewer) => viewer,
        None => return Ok((false, false)),
    };

    let flags: (bool, bool) = sqlx::query_as(
        "
        SELECT
            EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND recipe_id = $2),
            EXISTS (SELECT 1 FROM cart_items WHERE user_id = $1 AND recipe_id = $2)
    ",
    )
    .bind(viewer.user_id)
    .bind(recipe_id)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(flags)
}

/// Builds the nested read representation of `recipe`.
pub async fn read_recipe(
    recipe: Recipe,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<RecipeRead, potion::Error> {
    let author = get_author(pool, recipe.author_id, viewer.map(|v| v.user_id))
        .await?
        .ok_or_else(|| NotFoundError::new("Recipe author no longer exists"))?;
    let ingredients = list_compositions(recipe.id, pool).await?;
    let (is_favorited, is_in_shopping_cart) = get_recipe_flags(recipe.id, viewer, pool).await?;

    Ok(RecipeRead {
        id: recipe.id,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        title: recipe.title,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

/// Rejects ingredient ids that are not in the catalog, naming the field.
async fn ensure_ingredients_exist(
    parts: &[CompositionWrite],
    conn: &mut PgConnection,
) -> Result<(), potion::Error> {
    let ids: Vec<Uuid> = parts.iter().map(|p| p.ingredient_id).collect();

    let (found,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_one(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    if found != ids.len() as i64 {
        return Err(TypeError::new("ingredients", "Unknown ingredient id").into());
    }

    Ok(())
}

async fn insert_compositions(
    recipe_id: Uuid,
    parts: &[CompositionWrite],
    conn: &mut PgConnection,
) -> Result<(), potion::Error> {
    ensure_ingredients_exist(parts, &mut *conn).await?;

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");

    query_builder.push_values(parts.iter(), |mut b, part| {
        b.push_bind(recipe_id)
            .push_bind(part.ingredient_id)
            .push_bind(part.amount);
    });

    query_builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

/// Inserts the recipe row under a fresh short id. Ids that are taken or
/// were retired are skipped.
async fn insert_recipe_row(
    author_id: Uuid,
    recipe: &RecipeWrite,
    conn: &mut PgConnection,
) -> Result<Uuid, potion::Error> {
    for _ in 0..SHORT_ID_ATTEMPTS {
        let short_id = ShortId::new_v4();

        let id: Option<(Uuid,)> = sqlx::query_as(
            "
            INSERT INTO recipes (author_id, title, text, cooking_time, image, short_id)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (SELECT 1 FROM retired_short_links WHERE short_id = $6)
            ON CONFLICT (short_id) DO NOTHING
            RETURNING id
        ",
        )
        .bind(author_id)
        .bind(&recipe.title)
        .bind(&recipe.text)
        .bind(recipe.cooking_time)
        .bind(&recipe.image)
        .bind(short_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(QueryError::from)?;

        match id {
            Some((id,)) => return Ok(id),
            None => log::warn!("Short id {short_id} is unavailable, drawing another"),
        }
    }

    Err(QueryError::new(String::from("Failed to allocate a short link")).into())
}

/// Creates a recipe with its ingredient list in one transaction.
pub async fn create_recipe(
    author_id: Uuid,
    recipe: RecipeWrite,
    pool: &Pool<Postgres>,
) -> Result<Uuid, potion::Error> {
    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let id = insert_recipe_row(author_id, &recipe, &mut tx).await?;
    insert_compositions(id, &recipe.ingredients, &mut tx).await?;

    tx.commit().await.map_err(QueryError::from)?;

    log::info!("User {author_id} published recipe {id}");
    Ok(id)
}

/// Applies a partial update. A present ingredient list replaces the stored
/// one; any failure rolls the whole update back.
pub async fn update_recipe(
    id: Uuid,
    patch: RecipePatch,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let result = sqlx::query(
        "
        UPDATE recipes SET
        title = COALESCE($1, title),
        text = COALESCE($2, text),
        cooking_time = COALESCE($3, cooking_time),
        image = COALESCE($4, image)
        WHERE id = $5
    ",
    )
    .bind(patch.title)
    .bind(patch.text)
    .bind(patch.cooking_time)
    .bind(patch.image)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(NotFoundError::new("No recipe exists with specified id").into());
    }

    if let Some(parts) = patch.ingredients {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(QueryError::from)?;

        insert_compositions(id, &parts, &mut tx).await?;
    }

    tx.commit().await.map_err(QueryError::from)?;

    Ok(())
}

/// Deletes a recipe and retires its short id for good. Compositions and
/// marks go with it through the foreign keys.
pub async fn delete_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<(), potion::Error> {
    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let deleted: Option<(ShortId,)> =
        sqlx::query_as("DELETE FROM recipes WHERE id = $1 RETURNING short_id")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(QueryError::from)?;

    let (short_id,) =
        deleted.ok_or_else(|| NotFoundError::new("No recipe exists with specified id"))?;

    sqlx::query("INSERT INTO retired_short_links (short_id) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(short_id)
        .execute(&mut *tx)
        .await
        .map_err(QueryError::from)?;

    tx.commit().await.map_err(QueryError::from)?;

    log::info!("Deleted recipe {id}, retired short id {short_id}");
    Ok(())
}

pub fn short_link(recipe: &Recipe, public_url: &str) -> ShortLink {
    ShortLink {
        short_link: format!(
            "{}/{SHORT_LINK_PREFIX}/{}/",
            public_url.trim_end_matches('/'),
            recipe.short_id
        ),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn short_link_embeds_short_id() {
        let short_id = ShortId::new_v4();
        let recipe = Recipe {
            id: 1,
            author_id: 1,
            title: "Pancakes".into(),
            text: "Mix".into(),
            cooking_time: 10,
            image: "img".into(),
            short_id,
            pub_date: Utc::now(),
        };

        assert_eq!(
            short_link(&recipe, "https://food.example/").short_link,
            format!("https://food.example/s/{short_id}/")
        );
        assert_eq!(
            short_link(&recipe, "https://food.example").short_link,
            short_link(&recipe, "https://food.example/").short_link
        );
    }
}
