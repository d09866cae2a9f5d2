use std::convert::Infallible;

use warp::{
    filters::BoxedFilter,
    http::StatusCode,
    reply::{Reply, Response},
    Filter, Rejection,
};

use super::{
    handlers::{self, IngredientQuery},
    reply::{handle_rejection, into_attachment, into_empty_response, into_response},
    state::AppState,
};
use crate::{
    constants::{MAX_BODY_BYTES, SHOPPING_LIST_FILENAME, SHORT_LINK_PREFIX},
    form::FormData,
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    pagination::PageQuery,
    schema::{ShortId, Uuid},
};

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body() -> impl Filter<Extract = (FormData,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Every route of the service, without rejection handling.
pub fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    recipe_lists(state.clone())
        .or(recipes(state.clone()))
        .unify()
        .or(recipe_marks(state.clone()))
        .unify()
        .or(short_links(state.clone()))
        .unify()
        .or(ingredients(state.clone()))
        .unify()
        .or(users(state))
        .unify()
        .boxed()
}

/// The service as served: routes, rejection rendering and request logging.
pub fn app(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    routes(state)
        .recover(handle_rejection)
        .with(warp::log("foodgram_sdk::api"))
}

// Matched before `/recipes/{id}` so the literal segments never reach the id parser.
fn recipe_lists(state: AppState) -> BoxedFilter<(Response,)> {
    let secret = state.secret.clone();

    let favorites = warp::path!("recipes" / "favorites")
        .and(warp::get())
        .and(warp::query::<PageQuery>())
        .and(with_session(secret.clone()))
        .and(with_state(state.clone()))
        .then(|query: PageQuery, session: SessionData, state: AppState| async move {
            into_response(
                handlers::list_favorites(query, session, state).await,
                StatusCode::OK,
            )
        });

    let cart = warp::path!("recipes" / "shopping_cart")
        .and(warp::get())
        .and(warp::query::<PageQuery>())
        .and(with_session(secret.clone()))
        .and(with_state(state.clone()))
        .then(|query: PageQuery, session: SessionData, state: AppState| async move {
            into_response(handlers::list_cart(query, session, state).await, StatusCode::OK)
        });

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(secret))
        .and(with_state(state))
        .then(|session: SessionData, state: AppState| async move {
            into_attachment(
                handlers::download_shopping_cart(session, state).await,
                SHOPPING_LIST_FILENAME,
            )
        });

    favorites.or(cart).unify().or(download).unify().boxed()
}

fn recipes(state: AppState) -> BoxedFilter<(Response,)> {
    let secret = state.secret.clone();

    let list = warp::path!("recipes")
        .and(warp::get())
        .and(warp::query::<PageQuery>())
        .and(with_possible_session(secret.clone()))
        .and(with_state(state.clone()))
        .then(
            |query: PageQuery, session: Option<SessionData>, state: AppState| async move {
                into_response(
                    handlers::list_recipes(query, session, state).await,
                    StatusCode::OK,
                )
            },
        );

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .then(|session: SessionData, data: FormData, state: AppState| async move {
            into_response(
                handlers::create_recipe(session, data, state).await,
                StatusCode::CREATED,
            )
        });

    let get = warp::path!("recipes" / Uuid)
        .and(warp::get())
        .and(with_possible_session(secret.clone()))
        .and(with_state(state.clone()))
        .then(
            |id: Uuid, session: Option<SessionData>, state: AppState| async move {
                into_response(handlers::get_recipe(id, session, state).await, StatusCode::OK)
            },
        );

    let update = warp::path!("recipes" / Uuid)
        .and(warp::patch())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .then(
            |id: Uuid, session: SessionData, data: FormData, state: AppState| async move {
                into_response(
                    handlers::update_recipe(id, session, data, state).await,
                    StatusCode::OK,
                )
            },
        );

    let delete = warp::path!("recipes" / Uuid)
        .and(warp::delete())
        .and(with_session(secret))
        .and(with_state(state.clone()))
        .then(|id: Uuid, session: SessionData, state: AppState| async move {
            into_empty_response(handlers::delete_recipe(id, session, state).await)
        });

    let link = warp::path!("recipes" / Uuid / "get-link")
        .and(warp::get())
        .and(with_state(state))
        .then(|id: Uuid, state: AppState| async move {
            into_response(handlers::get_link(id, state).await, StatusCode::OK)
        });

    list.or(create)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(link)
        .unify()
        .boxed()
}

fn recipe_marks(state: AppState) -> BoxedFilter<(Response,)> {
    let secret = state.secret.clone();

    let favorite = warp::path!("recipes" / Uuid / "favorite")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(with_state(state.clone()))
        .then(|id: Uuid, session: SessionData, state: AppState| async move {
            into_response(
                handlers::add_favorite(id, session, state).await,
                StatusCode::CREATED,
            )
        });

    let unfavorite = warp::path!("recipes" / Uuid / "favorite")
        .and(warp::delete())
        .and(with_session(secret.clone()))
        .and(with_state(state.clone()))
        .then(|id: Uuid, session: SessionData, state: AppState| async move {
            into_empty_response(handlers::remove_favorite(id, session, state).await)
        });

    let add_to_cart = warp::path!("recipes" / Uuid / "shopping_cart")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(with_state(state.clone()))
        .then(|id: Uuid, session: SessionData, state: AppState| async move {
            into_response(
                handlers::add_cart_item(id, session, state).await,
                StatusCode::CREATED,
            )
        });

    let remove_from_cart = warp::path!("recipes" / Uuid / "shopping_cart")
        .and(warp::delete())
        .and(with_session(secret))
        .and(with_state(state))
        .then(|id: Uuid, session: SessionData, state: AppState| async move {
            into_empty_response(handlers::remove_cart_item(id, session, state).await)
        });

    favorite
        .or(unfavorite)
        .unify()
        .or(add_to_cart)
        .unify()
        .or(remove_from_cart)
        .unify()
        .boxed()
}

fn short_links(state: AppState) -> BoxedFilter<(Response,)> {
    warp::path(SHORT_LINK_PREFIX)
        .and(warp::path::param::<ShortId>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_possible_session(state.secret.clone()))
        .and(with_state(state))
        .then(
            |short_id: ShortId, session: Option<SessionData>, state: AppState| async move {
                into_response(
                    handlers::resolve_short_link(short_id, session, state).await,
                    StatusCode::OK,
                )
            },
        )
        .boxed()
}

fn ingredients(state: AppState) -> BoxedFilter<(Response,)> {
    let list = warp::path!("ingredients")
        .and(warp::get())
        .and(warp::query::<IngredientQuery>())
        .and(with_state(state.clone()))
        .then(|query: IngredientQuery, state: AppState| async move {
            into_response(handlers::list_ingredients(query, state).await, StatusCode::OK)
        });

    let get = warp::path!("ingredients" / Uuid)
        .and(warp::get())
        .and(with_state(state))
        .then(|id: Uuid, state: AppState| async move {
            into_response(handlers::get_ingredient(id, state).await, StatusCode::OK)
        });

    list.or(get).unify().boxed()
}

fn users(state: AppState) -> BoxedFilter<(Response,)> {
    let secret = state.secret.clone();

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(warp::query::<PageQuery>())
        .and(with_session(secret.clone()))
        .and(with_state(state.clone()))
        .then(|query: PageQuery, session: SessionData, state: AppState| async move {
            into_response(
                handlers::list_subscriptions(query, session, state).await,
                StatusCode::OK,
            )
        });

    let subscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::post())
        .and(warp::query::<PageQuery>())
        .and(with_session(secret.clone()))
        .and(with_state(state.clone()))
        .then(
            |author_id: Uuid, query: PageQuery, session: SessionData, state: AppState| async move {
                into_response(
                    handlers::subscribe(author_id, query, session, state).await,
                    StatusCode::CREATED,
                )
            },
        );

    let unsubscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::delete())
        .and(with_session(secret))
        .and(with_state(state))
        .then(|author_id: Uuid, session: SessionData, state: AppState| async move {
            into_empty_response(handlers::unsubscribe(author_id, session, state).await)
        });

    subscriptions
        .or(subscribe)
        .unify()
        .or(unsubscribe)
        .unify()
        .boxed()
}
