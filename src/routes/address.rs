//! Address route handlers
//!
//! Thin HTTP wrappers over the address workflow.

use crate::address::{AddressFilter, AddressRecord, Payload};
use crate::auth::Session;
use crate::error::{not_found_error, validation_error, ApiResult, AppError};
use crate::models::{RowsAffected, SuccessResponse};
use crate::state::SharedState;
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use validator::Validate;

fn validated(filter: AddressFilter) -> ApiResult<AddressFilter> {
    filter
        .validate()
        .map_err(|e| validation_error(format!("Invalid filter: {}", e)))?;
    Ok(filter)
}

/// Bulk writes must name at least one filter field
fn bulk_filter(filter: AddressFilter) -> ApiResult<AddressFilter> {
    let filter = validated(filter)?;
    if filter.is_empty() {
        return Err(AppError::BadRequest(
            "Bulk operations require at least one filter parameter".to_string(),
        ));
    }
    Ok(filter)
}

/// List addresses matching the query filter
pub async fn list_addresses(
    State(state): State<SharedState>,
    Query(filter): Query<AddressFilter>,
) -> ApiResult<Json<SuccessResponse<Vec<AddressRecord>>>> {
    let filter = validated(filter)?;
    let addresses = state.addresses.list(&filter).await?;

    debug!("Listing {} addresses", addresses.len());

    Ok(Json(SuccessResponse::with_data(
        format!("{} addresses found.", addresses.len()),
        addresses,
    )))
}

/// Get a single address by id
pub async fn get_address(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<AddressRecord>>> {
    let address = state
        .addresses
        .get(&AddressFilter::by_id(id))
        .await?
        .ok_or_else(|| not_found_error(format!("Address {} not found", id)))?;

    Ok(Json(SuccessResponse::with_data(
        "Address retrieved successfully.",
        address,
    )))
}

/// Create a new geocoded address
pub async fn create_address(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<Payload>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<AddressRecord>>)> {
    let address = state.addresses.create(&payload, &session).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Address created successfully.", address)),
    ))
}

/// Update one address by id
pub async fn update_address(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i32>,
    Json(changes): Json<Payload>,
) -> ApiResult<Json<SuccessResponse<RowsAffected>>> {
    let rows = state
        .addresses
        .update(&AddressFilter::by_id(id), &changes, &session)
        .await?;

    Ok(Json(SuccessResponse::with_data(
        format!("{} addresses updated.", rows),
        RowsAffected { rows },
    )))
}

/// Update every address matching the query filter
pub async fn update_addresses(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Query(filter): Query<AddressFilter>,
    Json(changes): Json<Payload>,
) -> ApiResult<Json<SuccessResponse<RowsAffected>>> {
    let filter = bulk_filter(filter)?;
    let rows = state.addresses.update(&filter, &changes, &session).await?;

    Ok(Json(SuccessResponse::with_data(
        format!("{} addresses updated.", rows),
        RowsAffected { rows },
    )))
}

/// Delete one address by id
pub async fn remove_address(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<RowsAffected>>> {
    let rows = state.addresses.remove(&AddressFilter::by_id(id)).await?;

    Ok(Json(SuccessResponse::with_data(
        format!("{} addresses removed.", rows),
        RowsAffected { rows },
    )))
}

/// Delete every address matching the query filter
pub async fn remove_addresses(
    State(state): State<SharedState>,
    Query(filter): Query<AddressFilter>,
) -> ApiResult<Json<SuccessResponse<RowsAffected>>> {
    let filter = bulk_filter(filter)?;
    let rows = state.addresses.remove(&filter).await?;

    Ok(Json(SuccessResponse::with_data(
        format!("{} addresses removed.", rows),
        RowsAffected { rows },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::testing::{InMemoryAddressStore, ScriptedGeocoder};
    use crate::address::{AddressService, FieldGovernor};
    use crate::auth::create_token;
    use crate::config::AuthConfig;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(geocoder: Arc<ScriptedGeocoder>, auth_enabled: bool) -> Router {
        let service = AddressService::new(
            Arc::new(InMemoryAddressStore::new()),
            geocoder,
            FieldGovernor::new(),
        );
        let state: SharedState = Arc::new(AppState::new(
            service,
            AuthConfig {
                enabled: auth_enabled,
                jwt_secret: "test-secret".to_string(),
            },
        ));

        Router::new()
            .route(
                "/addresses",
                get(list_addresses)
                    .post(create_address)
                    .put(update_addresses)
                    .delete(remove_addresses),
            )
            .route(
                "/addresses/{id}",
                get(get_address).put(update_address).delete(remove_address),
            )
            .route_layer(from_fn_with_state(state.clone(), crate::auth::identity_middleware))
            .with_state(state)
    }

    fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn address_body() -> Value {
        json!({
            "zipcode": "01310-100",
            "street": "Av. Paulista",
            "number": "1578",
            "neighborhood": "Bela Vista",
            "state": "SP",
            "city": "São Paulo"
        })
    }

    #[tokio::test]
    async fn test_create_records_authenticated_user() {
        let geocoder = Arc::new(ScriptedGeocoder::new());
        geocoder.push_ok(vec![("-23.56", "-46.65")]);
        let app = app(geocoder, true);
        let token = create_token(12, "maria@example.com", "test-secret").unwrap();

        let response = app
            .oneshot(json_request("POST", "/addresses", address_body(), Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["createdByUserId"], json!(12));
        assert_eq!(body["data"]["latitude"], json!(-23.56));
    }

    #[tokio::test]
    async fn test_create_with_auth_disabled_is_anonymous() {
        let geocoder = Arc::new(ScriptedGeocoder::new());
        geocoder.push_ok(vec![("1.0", "2.0")]);
        let app = app(geocoder, false);

        let response = app
            .oneshot(json_request("POST", "/addresses", address_body(), Some("ignored")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["data"]["createdByUserId"], Value::Null);
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let app = app(Arc::new(ScriptedGeocoder::new()), true);

        let response = app
            .oneshot(json_request("POST", "/addresses", address_body(), Some("bogus")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_geocoder_failure_is_bad_gateway() {
        let geocoder = Arc::new(ScriptedGeocoder::new());
        geocoder.push_status(500);
        let app = app(geocoder, true);

        let response = app
            .oneshot(json_request("POST", "/addresses", address_body(), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["code"], json!("UPSTREAM_ERROR"));
    }

    #[tokio::test]
    async fn test_incomplete_payload_is_validation_error() {
        let app = app(Arc::new(ScriptedGeocoder::new()), true);

        let response = app
            .oneshot(json_request("POST", "/addresses", json!({ "street": "Rua A" }), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], json!("VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn test_get_missing_address_is_not_found() {
        let app = app(Arc::new(ScriptedGeocoder::new()), true);

        let response = app.oneshot(empty_request("GET", "/addresses/99")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bulk_delete_requires_filter() {
        let app = app(Arc::new(ScriptedGeocoder::new()), true);

        let response = app.oneshot(empty_request("DELETE", "/addresses")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_key_filter_is_rejected() {
        let app = app(Arc::new(ScriptedGeocoder::new()), true);

        let response = app
            .oneshot(empty_request("GET", "/addresses?key=nope"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_by_id_reports_rows() {
        let geocoder = Arc::new(ScriptedGeocoder::new());
        geocoder.push_ok(vec![("1.0", "2.0")]);
        geocoder.push_ok(vec![("3.0", "4.0")]);
        let app = app(geocoder, true);

        let created = app
            .clone()
            .oneshot(json_request("POST", "/addresses", address_body(), None))
            .await
            .unwrap();
        let id = body_json(created).await["data"]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/addresses/{}", id),
                json!({ "number": "1600" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["rows"], json!(1));

        let fetched = app
            .oneshot(empty_request("GET", &format!("/addresses/{}", id)))
            .await
            .unwrap();
        let body = body_json(fetched).await;
        assert_eq!(body["data"]["number"], json!("1600"));
        assert_eq!(body["data"]["longitude"], json!(4.0));
    }
}
