use std::convert::Infallible;

use serde::Serialize;
use serde_json::json;
use warp::{
    http::StatusCode,
    reject::Rejection,
    reply::{self, Reply, Response},
};

use crate::middleware::Unauthorized;

pub fn json_reply<T: Serialize>(value: &T, status: StatusCode) -> Response {
    reply::with_status(reply::json(value), status).into_response()
}

pub fn no_content() -> Response {
    reply::with_status(reply::reply(), StatusCode::NO_CONTENT).into_response()
}

fn errors_body(status: StatusCode, info: &str) -> Response {
    json_reply(&json!({ "errors": info }), status)
}

/// Renders a store error as `{"errors": "<reason>"}` with its status code.
pub fn error_reply(err: potion::Error) -> Response {
    let status =
        StatusCode::from_u16(err.code as u16).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let info = err
        .info
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string());

    errors_body(status, &info)
}

pub fn into_response<T: Serialize>(
    result: Result<T, potion::Error>,
    status: StatusCode,
) -> Response {
    match result {
        Ok(value) => json_reply(&value, status),
        Err(e) => error_reply(e),
    }
}

pub fn into_empty_response(result: Result<(), potion::Error>) -> Response {
    match result {
        Ok(()) => no_content(),
        Err(e) => error_reply(e),
    }
}

/// Plain-text body served as a download named `filename`.
pub fn into_attachment(result: Result<String, potion::Error>, filename: &str) -> Response {
    match result {
        Ok(body) => reply::with_header(
            body,
            "content-disposition",
            format!("attachment; filename=\"{filename}\""),
        )
        .into_response(),
        Err(e) => error_reply(e),
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, info) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found"))
    } else if err.find::<Unauthorized>().is_some() {
        (
            StatusCode::UNAUTHORIZED,
            String::from("Authentication credentials were not provided"),
        )
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Malformed payload: {e}"))
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, format!("{e}"))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, String::from("Payload too large"))
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, String::from("Content-Length required"))
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            String::from("Expected a JSON payload"),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            String::from("Method not allowed"),
        )
    } else {
        log::error!("Unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Internal server error"),
        )
    };

    Ok(errors_body(status, &info))
}
