use std::convert::Infallible;

use log::error;
use serde::de::DeserializeOwned;
use warp::body::BodyDeserializeError;
use warp::reject::{
    InvalidQuery, LengthRequired, MethodNotAllowed, PayloadTooLarge, UnsupportedMediaType,
};
use warp::reply::{self, Reply, Response};
use warp::{Filter, Rejection};

use super::handlers;
use super::types::{ApiError, AppState, ListQuery};

/// Largest accepted JSON body.
const MAX_BODY_BYTES: u64 = 16 * 1024;

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// /owners/ and /owners/:id
pub fn owner_routes(
    state: AppState,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let create = warp::path!("owners")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::create_owner);

    let list = warp::path!("owners")
        .and(warp::get())
        .and(warp::query::<ListQuery>())
        .and(with_state(state.clone()))
        .and_then(handlers::list_owners);

    let get = warp::path!("owners" / i64)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_owner);

    let update = warp::path!("owners" / i64)
        .and(warp::put())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::update_owner);

    let delete = warp::path!("owners" / i64)
        .and(warp::delete())
        .and(with_state(state))
        .and_then(handlers::delete_owner);

    create
        .or(list)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
}

/// /dogs/, /dogs/:id and the dog search endpoints
pub fn dog_routes(state: AppState) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let create = warp::path!("dogs")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::create_dog);

    let list = warp::path!("dogs")
        .and(warp::get())
        .and(warp::query::<ListQuery>())
        .and(with_state(state.clone()))
        .and_then(handlers::list_dogs);

    let get = warp::path!("dogs" / i64)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_dog);

    let update = warp::path!("dogs" / i64)
        .and(warp::put())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::update_dog);

    let delete = warp::path!("dogs" / i64)
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and_then(handlers::delete_dog);

    let by_city = warp::path!("dogs" / "city" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::dogs_by_city);

    let by_owner_name = warp::path!("dogs" / "owner-name" / String / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::dogs_by_owner_name);

    let by_sex = warp::path!("dogs" / "sex" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::dogs_by_sex);

    let by_sterilization = warp::path!("dogs" / "sterilized" / bool)
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::dogs_by_sterilization);

    create
        .or(list)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(by_city)
        .unify()
        .or(by_owner_name)
        .unify()
        .or(by_sex)
        .unify()
        .or(by_sterilization)
        .unify()
}

/// GET /health
pub fn health_route() -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("health")
        .and(warp::get())
        .map(|| reply::json(&serde_json::json!({ "status": "ok" })).into_response())
}

/// Turn warp's own rejections (unknown route, bad body, bad query) into JSON errors.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let api_error = if err.is_not_found() {
        ApiError::RouteNotFound
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        ApiError::BadRequest(e.to_string())
    } else if let Some(e) = err.find::<InvalidQuery>() {
        ApiError::BadRequest(e.to_string())
    } else if err.find::<LengthRequired>().is_some() {
        ApiError::BadRequest(String::from("content-length header required"))
    } else if err.find::<PayloadTooLarge>().is_some() {
        ApiError::BadRequest(String::from("payload too large"))
    } else if err.find::<UnsupportedMediaType>().is_some() {
        ApiError::BadRequest(String::from("expected an application/json body"))
    } else if err.find::<MethodNotAllowed>().is_some() {
        ApiError::MethodNotAllowed
    } else {
        error!("Unhandled rejection: {:?}", err);
        ApiError::Internal
    };
    Ok(api_error.into_response())
}

/// Every endpoint, with rejection recovery and request logging.
pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    owner_routes(state.clone())
        .or(dog_routes(state))
        .unify()
        .or(health_route())
        .unify()
        .recover(handle_rejection)
        .unify()
        .with(warp::log("kennel::http"))
}
