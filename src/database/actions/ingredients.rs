use crate::{
    constants::{INGREDIENT_NAME_MAX_LENGTH, UNIT_MAX_LENGTH},
    error::{ConflictError, QueryError, TypeError},
    schema::{ImportSummary, Ingredient, IngredientRecord, Uuid},
};

use sqlx::{Pool, Postgres};

/// Escapes LIKE wildcards so user input only ever matches literally.
fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Ingredients ordered by name, optionally restricted to a case-insensitive
/// name prefix.
pub async fn fetch_ingredients(
    name: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, potion::Error> {
    let pattern = prefix_pattern(name.map(str::trim).unwrap_or(""));

    let rows: Vec<Ingredient> =
        sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name")
            .bind(pattern)
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn get_ingredient(
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, potion::Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

fn validate_ingredient(name: &str, unit: &str) -> Result<(), TypeError> {
    if name.is_empty() {
        return Err(TypeError::new("name", "This field may not be blank"));
    }
    if name.chars().count() > INGREDIENT_NAME_MAX_LENGTH {
        return Err(TypeError::new("name", "Name is too long"));
    }
    if unit.is_empty() {
        return Err(TypeError::new("unit", "This field may not be blank"));
    }
    if unit.chars().count() > UNIT_MAX_LENGTH {
        return Err(TypeError::new("unit", "Unit is too long"));
    }
    Ok(())
}

pub async fn create_ingredient(
    name: &str,
    unit: &str,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, potion::Error> {
    let (name, unit) = (name.trim(), unit.trim());
    validate_ingredient(name, unit)?;

    let row: Option<Ingredient> = sqlx::query_as(
        "
        INSERT INTO ingredients (name, unit)
        VALUES ($1, $2)
        ON CONFLICT (name) DO NOTHING RETURNING *;
    ",
    )
    .bind(name)
    .bind(unit)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    row.ok_or_else(|| ConflictError::new("Ingredient with this name already exists").into())
}

/// Bulk load keyed by the unique ingredient name. Existing names and
/// incomplete records are skipped; the whole batch is one transaction.
pub async fn import_ingredients(
    records: Vec<IngredientRecord>,
    pool: &Pool<Postgres>,
) -> Result<ImportSummary, potion::Error> {
    let mut summary = ImportSummary::default();
    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    for record in records {
        let name = record.name.as_deref().map(str::trim).unwrap_or("");
        let unit = record.unit.as_deref().map(str::trim).unwrap_or("");

        if validate_ingredient(name, unit).is_err() {
            log::warn!("Skipping malformed ingredient record: {record:?}");
            summary.skipped += 1;
            continue;
        }

        let result = sqlx::query(
            "INSERT INTO ingredients (name, unit) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(unit)
        .execute(&mut *tx)
        .await
        .map_err(QueryError::from)?;

        if result.rows_affected() > 0 {
            log::trace!("> Created ingredient {name} ({unit})");
            summary.created += 1;
        } else {
            summary.skipped += 1;
        }
    }

    tx.commit().await.map_err(QueryError::from)?;

    log::info!(
        "Ingredient import done: {} created, {} skipped",
        summary.created,
        summary.skipped
    );

    Ok(summary)
}
