pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE: i64 = 1_000_000;

pub const DEFAULT_RECIPES_LIMIT: i64 = 3;

pub const SESSION_LIFETIME_HOURS: i64 = 1;
pub const SESSION_COOKIE: &str = "session";

pub const SHORT_LINK_PREFIX: &str = "s";
pub const SHORT_ID_ATTEMPTS: usize = 3;

pub const TITLE_MAX_LENGTH: usize = 256;
pub const INGREDIENT_NAME_MAX_LENGTH: usize = 200;
pub const UNIT_MAX_LENGTH: usize = 50;

pub const MAX_BODY_BYTES: u64 = 8 * 1024 * 1024;
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";
