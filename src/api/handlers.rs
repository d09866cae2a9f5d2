use serde::Deserialize;

use super::state::AppState;
use crate::{
    actions,
    error::NotFoundError,
    form::{Form, FormData, RecipePatch, RecipeWrite},
    jwt::SessionData,
    pagination::{PageContext, PageQuery},
    schema::{Ingredient, RecipeMinified, RecipeRead, ShortId, ShortLink, Subscription, Uuid},
};

#[derive(Deserialize, Debug, Default)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

async fn load_recipe(
    id: Uuid,
    session: Option<&SessionData>,
    state: &AppState,
) -> Result<RecipeRead, potion::Error> {
    let recipe = actions::get_recipe(id, &state.pool)
        .await?
        .ok_or_else(|| NotFoundError::new("No recipe exists with specified id"))?;

    actions::read_recipe(recipe, session, &state.pool).await
}

pub async fn list_recipes(
    query: PageQuery,
    session: Option<SessionData>,
    state: AppState,
) -> Result<PageContext<RecipeRead>, potion::Error> {
    actions::fetch_recipes(&query, session.as_ref(), &state.url("/recipes"), &state.pool).await
}

pub async fn get_recipe(
    id: Uuid,
    session: Option<SessionData>,
    state: AppState,
) -> Result<RecipeRead, potion::Error> {
    load_recipe(id, session.as_ref(), &state).await
}

pub async fn create_recipe(
    session: SessionData,
    data: FormData,
    state: AppState,
) -> Result<RecipeRead, potion::Error> {
    let recipe = RecipeWrite::try_from(Form::from_data(data))?;
    let id = actions::create_recipe(session.user_id, recipe, &state.pool).await?;

    load_recipe(id, Some(&session), &state).await
}

pub async fn update_recipe(
    id: Uuid,
    session: SessionData,
    data: FormData,
    state: AppState,
) -> Result<RecipeRead, potion::Error> {
    actions::get_recipe_mut(id, &session, &state.pool).await?;

    let patch = RecipePatch::try_from(Form::from_data(data))?;
    actions::update_recipe(id, patch, &state.pool).await?;

    load_recipe(id, Some(&session), &state).await
}

pub async fn delete_recipe(
    id: Uuid,
    session: SessionData,
    state: AppState,
) -> Result<(), potion::Error> {
    actions::get_recipe_mut(id, &session, &state.pool).await?;
    actions::delete_recipe(id, &state.pool).await
}

pub async fn get_link(id: Uuid, state: AppState) -> Result<ShortLink, potion::Error> {
    let recipe = actions::get_recipe(id, &state.pool)
        .await?
        .ok_or_else(|| NotFoundError::new("No recipe exists with specified id"))?;

    Ok(actions::short_link(&recipe, &state.public_url))
}

pub async fn resolve_short_link(
    short_id: ShortId,
    session: Option<SessionData>,
    state: AppState,
) -> Result<RecipeRead, potion::Error> {
    let recipe = actions::get_recipe_by_short_id(short_id, &state.pool)
        .await?
        .ok_or_else(|| NotFoundError::new("Short link does not resolve to a recipe"))?;

    actions::read_recipe(recipe, session.as_ref(), &state.pool).await
}

pub async fn add_favorite(
    id: Uuid,
    session: SessionData,
    state: AppState,
) -> Result<RecipeMinified, potion::Error> {
    actions::add_to_favorites(id, session.user_id, &state.pool).await
}

pub async fn remove_favorite(
    id: Uuid,
    session: SessionData,
    state: AppState,
) -> Result<(), potion::Error> {
    actions::remove_from_favorites(id, session.user_id, &state.pool).await
}

pub async fn add_cart_item(
    id: Uuid,
    session: SessionData,
    state: AppState,
) -> Result<RecipeMinified, potion::Error> {
    actions::add_to_cart(id, session.user_id, &state.pool).await
}

pub async fn remove_cart_item(
    id: Uuid,
    session: SessionData,
    state: AppState,
) -> Result<(), potion::Error> {
    actions::remove_from_cart(id, session.user_id, &state.pool).await
}

pub async fn list_favorites(
    query: PageQuery,
    session: SessionData,
    state: AppState,
) -> Result<PageContext<RecipeMinified>, potion::Error> {
    actions::fetch_favorites(
        session.user_id,
        &query,
        &state.url("/recipes/favorites"),
        &state.pool,
    )
    .await
}

pub async fn list_cart(
    query: PageQuery,
    session: SessionData,
    state: AppState,
) -> Result<PageContext<RecipeMinified>, potion::Error> {
    actions::fetch_cart(
        session.user_id,
        &query,
        &state.url("/recipes/shopping_cart"),
        &state.pool,
    )
    .await
}

pub async fn download_shopping_cart(
    session: SessionData,
    state: AppState,
) -> Result<String, potion::Error> {
    let items = actions::shopping_list(session.user_id, &state.pool).await?;
    Ok(actions::format_shopping_list(&items))
}

pub async fn list_ingredients(
    query: IngredientQuery,
    state: AppState,
) -> Result<Vec<Ingredient>, potion::Error> {
    actions::fetch_ingredients(query.name.as_deref(), &state.pool).await
}

pub async fn get_ingredient(id: Uuid, state: AppState) -> Result<Ingredient, potion::Error> {
    actions::get_ingredient(id, &state.pool)
        .await?
        .ok_or_else(|| NotFoundError::new("No ingredient exists with specified id").into())
}

pub async fn list_subscriptions(
    query: PageQuery,
    session: SessionData,
    state: AppState,
) -> Result<PageContext<Subscription>, potion::Error> {
    actions::fetch_subscriptions(
        session.user_id,
        &query,
        &state.url("/users/subscriptions"),
        &state.pool,
    )
    .await
}

pub async fn subscribe(
    author_id: Uuid,
    query: PageQuery,
    session: SessionData,
    state: AppState,
) -> Result<Subscription, potion::Error> {
    actions::follow_author(
        session.user_id,
        author_id,
        query.recipes_limit(),
        &state.pool,
    )
    .await
}

pub async fn unsubscribe(
    author_id: Uuid,
    session: SessionData,
    state: AppState,
) -> Result<(), potion::Error> {
    actions::unfollow_author(session.user_id, author_id, &state.pool).await
}

