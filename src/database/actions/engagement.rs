use crate::{
    constants::RECIPE_COUNT_PER_PAGE,
    error::{ConflictError, NotFoundError, QueryError},
    pagination::{PageContext, PageQuery},
    schema::{RecipeMinified, ShoppingListItem, Uuid},
};

use super::recipes::get_recipe;
use sqlx::{Pool, Postgres};

/// The two user/recipe marks. Both tables share one shape: a unique
/// `(user_id, recipe_id)` pair plus `added_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeMark {
    Favorite,
    Cart,
}

impl RecipeMark {
    fn table(self) -> &'static str {
        match self {
            RecipeMark::Favorite => "favorites",
            RecipeMark::Cart => "cart_items",
        }
    }

    fn already_marked(self) -> &'static str {
        match self {
            RecipeMark::Favorite => "Recipe is already in favorites",
            RecipeMark::Cart => "Recipe is already in the shopping cart",
        }
    }

    fn not_marked(self) -> &'static str {
        match self {
            RecipeMark::Favorite => "Recipe is not in favorites",
            RecipeMark::Cart => "Recipe is not in the shopping cart",
        }
    }
}

/// Marks `recipe_id` for `user_id`. A concurrent duplicate loses on the
/// primary key and reports the conflict.
pub async fn add_mark(
    mark: RecipeMark,
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeMinified, potion::Error> {
    let recipe = get_recipe(recipe_id, pool)
        .await?
        .ok_or_else(|| NotFoundError::new("No recipe exists with specified id"))?;

    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        mark.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| match e {
        // Recipe deleted since the lookup above.
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            NotFoundError::new("No recipe exists with specified id").into()
        }
        e => potion::Error::from(QueryError::from(e)),
    })?;

    if result.rows_affected() == 0 {
        return Err(ConflictError::new(mark.already_marked()).into());
    }

    Ok(RecipeMinified::from(&recipe))
}

pub async fn remove_mark(
    mark: RecipeMark,
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    if get_recipe(recipe_id, pool).await?.is_none() {
        return Err(NotFoundError::new("No recipe exists with specified id").into());
    }

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        mark.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(NotFoundError::new(mark.not_marked()).into());
    }

    Ok(())
}

/// Marked recipes of `user_id`, most recently marked first.
pub async fn fetch_marks(
    mark: RecipeMark,
    user_id: Uuid,
    query: &PageQuery,
    base_url: &str,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeMinified>, potion::Error> {
    let limit = query.page_size(RECIPE_COUNT_PER_PAGE);

    let (total,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM {} WHERE user_id = $1",
        mark.table()
    ))
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    let rows: Vec<RecipeMinified> = sqlx::query_as(&format!(
        "
        SELECT r.id, r.title, r.image, r.cooking_time
        FROM {} m
        INNER JOIN recipes r ON r.id = m.recipe_id
        WHERE m.user_id = $1
        ORDER BY m.added_at DESC, r.id DESC
        LIMIT $2 OFFSET $3
    ",
        mark.table()
    ))
    .bind(user_id)
    .bind(limit)
    .bind(query.offset(RECIPE_COUNT_PER_PAGE))
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(PageContext::from_rows(
        rows,
        total,
        query.page(),
        limit,
        base_url,
    ))
}

pub async fn add_to_favorites(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeMinified, potion::Error> {
    add_mark(RecipeMark::Favorite, recipe_id, user_id, pool).await
}

pub async fn remove_from_favorites(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    remove_mark(RecipeMark::Favorite, recipe_id, user_id, pool).await
}

pub async fn add_to_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeMinified, potion::Error> {
    add_mark(RecipeMark::Cart, recipe_id, user_id, pool).await
}

pub async fn remove_from_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    remove_mark(RecipeMark::Cart, recipe_id, user_id, pool).await
}

pub async fn fetch_favorites(
    user_id: Uuid,
    query: &PageQuery,
    base_url: &str,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeMinified>, potion::Error> {
    fetch_marks(RecipeMark::Favorite, user_id, query, base_url, pool).await
}

pub async fn fetch_cart(
    user_id: Uuid,
    query: &PageQuery,
    base_url: &str,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeMinified>, potion::Error> {
    fetch_marks(RecipeMark::Cart, user_id, query, base_url, pool).await
}

/// Ingredients of every recipe in the cart, amounts summed per ingredient.
pub async fn shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListItem>, potion::Error> {
    let rows: Vec<ShoppingListItem> = sqlx::query_as(
        "
        SELECT i.name AS name, i.unit AS unit, SUM(ri.amount) AS amount
        FROM cart_items c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
        GROUP BY i.id, i.name, i.unit
        ORDER BY i.name
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

pub fn format_shopping_list(items: &[ShoppingListItem]) -> String {
    if items.is_empty() {
        return String::from("Shopping cart is empty\n");
    }

    items
        .iter()
        .map(|item| {
            let amount = if item.amount.fract() == 0. {
                format!("{}", item.amount as i64)
            } else {
                format!("{:.2}", item.amount)
            };
            format!("{} ({}): {}\n", item.name, item.unit, amount)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, unit: &str, amount: f64) -> ShoppingListItem {
        ShoppingListItem {
            name: name.to_string(),
            unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn formats_shopping_list_lines() {
        let text = format_shopping_list(&[item("flour", "g", 350.), item("milk", "ml", 0.25)]);

        assert_eq!(text, "flour (g): 350\nmilk (ml): 0.25\n");
    }

    #[test]
    fn empty_cart_message() {
        assert_eq!(format_shopping_list(&[]), "Shopping cart is empty\n");
    }

    #[test]
    fn marks_use_their_own_tables() {
        assert_eq!(RecipeMark::Favorite.table(), "favorites");
        assert_eq!(RecipeMark::Cart.table(), "cart_items");
        assert_ne!(
            RecipeMark::Favorite.already_marked(),
            RecipeMark::Cart.already_marked()
        );
    }
}
