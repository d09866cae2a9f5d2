use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Uuid = i32;
pub type ShortId = uuid::Uuid;

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub avatar: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

/// Fields needed to register an account. The password arrives in plain text
/// and is hashed by the identity store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
}

/// One record of an ingredient bulk load.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientRecord {
    pub name: Option<String>,
    #[serde(alias = "measurement_unit")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub created: u64,
    pub skipped: u64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub short_id: ShortId,
    pub pub_date: DateTime<Utc>,
}

/// A recipe's ingredient with its quantity, as embedded in [`RecipeRead`].
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Composition {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub amount: f64,
}

/// Compact recipe returned by favorite/cart marks and subscription previews.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeMinified {
    pub id: Uuid,
    pub title: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<&Recipe> for RecipeMinified {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title.to_owned(),
            image: recipe.image.to_owned(),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Public profile of an account. `is_subscribed` is relative to the caller.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorRead {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRead {
    pub id: Uuid,
    pub author: AuthorRead,
    pub ingredients: Vec<Composition>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub title: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct SubscriptionRow {
    #[sqlx(flatten)]
    pub author: AuthorRead,
    pub recipes_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeMinified>,
    pub recipes_count: i64,
    pub avatar: Option<String>,
}

impl Subscription {
    pub fn new(author: AuthorRead, recipes: Vec<RecipeMinified>, recipes_count: i64) -> Self {
        Self {
            email: author.email,
            id: author.id,
            username: author.username,
            first_name: author.first_name,
            last_name: author.last_name,
            is_subscribed: author.is_subscribed,
            recipes,
            recipes_count,
            avatar: author.avatar,
        }
    }
}

/// One line of the aggregated shopping list.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, PartialEq)]
pub struct ShoppingListItem {
    pub name: String,
    pub unit: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShortLink {
    #[serde(rename = "short-link")]
    pub short_link: String,
}
