//! Request handlers.
//!
//! Each handler runs one linear sequence: validate, call storage once, turn the
//! outcome into a JSON reply. Failures are rendered as `ApiError` replies, so
//! handlers never reject.

use log::{debug, warn};
use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};
use warp::Rejection;

use super::types::{ApiError, AppState, DeletedResponse, ListQuery};
use super::validation::Validate;
use crate::error_handling::types::{StorageError, ValidationError};
use crate::storage::dog_filter;
use crate::storage::types::{DogFilter, NewDog, NewOwner, Sex};

fn respond<T: Serialize>(result: Result<T, ApiError>, status: StatusCode) -> Response {
    match result {
        Ok(body) => reply::with_status(reply::json(&body), status).into_response(),
        Err(e) => e.into_response(),
    }
}

fn invalid(err: ValidationError) -> Response {
    warn!("Rejected payload: {}", err);
    ApiError::Validation(err).into_response()
}

fn found<T>(result: Result<Option<T>, StorageError>, entity: &'static str) -> Result<T, ApiError> {
    result?.ok_or(ApiError::NotFound(entity))
}

fn deleted(result: Result<bool, StorageError>, entity: &'static str) -> Result<DeletedResponse, ApiError> {
    if result? {
        Ok(DeletedResponse {
            detail: format!("{} deleted", entity),
        })
    } else {
        Err(ApiError::NotFound(entity))
    }
}

/// Ids in the path are read as `i64`; anything outside the stored `i32` range names no record.
fn record_id(raw: i64, entity: &'static str) -> Result<i32, ApiError> {
    i32::try_from(raw).map_err(|_| ApiError::NotFound(entity))
}

/// Path parameters arrive percent-encoded.
fn decode_segment(raw: &str) -> Result<String, ApiError> {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .map_err(|_| ApiError::BadRequest(String::from("path segment is not valid UTF-8")))
}

/// POST /owners/
pub async fn create_owner(owner: NewOwner, state: AppState) -> Result<Response, Rejection> {
    if let Err(e) = owner.validate() {
        return Ok(invalid(e));
    }
    let result = state.storage.create_owner(&owner).await.map_err(ApiError::from);
    Ok(respond(result, StatusCode::CREATED))
}

/// GET /owners/?skip&limit
pub async fn list_owners(query: ListQuery, state: AppState) -> Result<Response, Rejection> {
    let page = state.paging.page(query.skip, query.limit);
    debug!("Listing owners {:?}", page);
    let result = state.storage.list_owners(page).await.map_err(ApiError::from);
    Ok(respond(result, StatusCode::OK))
}

/// GET /owners/:id
pub async fn get_owner(id: i64, state: AppState) -> Result<Response, Rejection> {
    let result = match record_id(id, "Owner") {
        Ok(id) => found(state.storage.get_owner(id).await, "Owner"),
        Err(e) => Err(e),
    };
    Ok(respond(result, StatusCode::OK))
}

/// PUT /owners/:id
pub async fn update_owner(id: i64, owner: NewOwner, state: AppState) -> Result<Response, Rejection> {
    if let Err(e) = owner.validate() {
        return Ok(invalid(e));
    }
    let result = match record_id(id, "Owner") {
        Ok(id) => found(state.storage.update_owner(id, &owner).await, "Owner"),
        Err(e) => Err(e),
    };
    Ok(respond(result, StatusCode::OK))
}

/// DELETE /owners/:id
pub async fn delete_owner(id: i64, state: AppState) -> Result<Response, Rejection> {
    let result = match record_id(id, "Owner") {
        Ok(id) => deleted(state.storage.delete_owner(id).await, "Owner"),
        Err(e) => Err(e),
    };
    Ok(respond(result, StatusCode::OK))
}

/// POST /dogs/
pub async fn create_dog(dog: NewDog, state: AppState) -> Result<Response, Rejection> {
    if let Err(e) = dog.validate() {
        return Ok(invalid(e));
    }
    let result = state.storage.create_dog(&dog).await.map_err(ApiError::from);
    Ok(respond(result, StatusCode::CREATED))
}

/// GET /dogs/?skip&limit
pub async fn list_dogs(query: ListQuery, state: AppState) -> Result<Response, Rejection> {
    let page = state.paging.page(query.skip, query.limit);
    debug!("Listing dogs {:?}", page);
    let result = state.storage.list_dogs(page).await.map_err(ApiError::from);
    Ok(respond(result, StatusCode::OK))
}

/// GET /dogs/:id
pub async fn get_dog(id: i64, state: AppState) -> Result<Response, Rejection> {
    let result = match record_id(id, "Dog") {
        Ok(id) => found(state.storage.get_dog(id).await, "Dog"),
        Err(e) => Err(e),
    };
    Ok(respond(result, StatusCode::OK))
}

/// PUT /dogs/:id
pub async fn update_dog(id: i64, dog: NewDog, state: AppState) -> Result<Response, Rejection> {
    if let Err(e) = dog.validate() {
        return Ok(invalid(e));
    }
    let result = match record_id(id, "Dog") {
        Ok(id) => found(state.storage.update_dog(id, &dog).await, "Dog"),
        Err(e) => Err(e),
    };
    Ok(respond(result, StatusCode::OK))
}

/// DELETE /dogs/:id
pub async fn delete_dog(id: i64, state: AppState) -> Result<Response, Rejection> {
    let result = match record_id(id, "Dog") {
        Ok(id) => deleted(state.storage.delete_dog(id).await, "Dog"),
        Err(e) => Err(e),
    };
    Ok(respond(result, StatusCode::OK))
}

async fn search_dogs(filter: Result<DogFilter, ApiError>, state: AppState) -> Response {
    let result = match filter {
        Ok(filter) => state.storage.find_dogs(filter).await.map_err(ApiError::from),
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK)
}

/// GET /dogs/city/:city
pub async fn dogs_by_city(city: String, state: AppState) -> Result<Response, Rejection> {
    let filter = decode_segment(&city).map(dog_filter::by_city);
    Ok(search_dogs(filter, state).await)
}

/// GET /dogs/owner-name/:name/:surname
pub async fn dogs_by_owner_name(
    first_name: String,
    last_name: String,
    state: AppState,
) -> Result<Response, Rejection> {
    let filter = decode_segment(&first_name).and_then(|first| {
        decode_segment(&last_name).map(|last| dog_filter::by_owner_name(first, last))
    });
    Ok(search_dogs(filter, state).await)
}

/// GET /dogs/sex/:sex
pub async fn dogs_by_sex(sex: String, state: AppState) -> Result<Response, Rejection> {
    let filter = decode_segment(&sex).and_then(|raw| {
        raw.parse::<Sex>()
            .map(DogFilter::Sex)
            .map_err(ApiError::Validation)
    });
    Ok(search_dogs(filter, state).await)
}

/// GET /dogs/sterilized/:flag
pub async fn dogs_by_sterilization(flag: bool, state: AppState) -> Result<Response, Rejection> {
    Ok(search_dogs(Ok(DogFilter::Sterilized(flag)), state).await)
}
