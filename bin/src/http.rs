// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! HTTP routes over [`DnsApi`]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use bindapi::{
    record::UnknownRecordType, resolve::Resolution, xfer::ZoneSnapshot, DnsApi, ErrorKind, Record,
    RecordType,
};
use serde_json::json;
use tracing::debug;

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Builds the router serving every route of the API
///
/// | route | handler |
/// |---|---|
/// | `GET /dns/zone/{zone_name}` | zone snapshot |
/// | `GET /dns/record/{domain}?record_type=A&record_type=MX` | record lookup |
/// | `POST /dns/record/{domain}` | add a record |
/// | `PUT /dns/record/{domain}` | replace an RRset |
/// | `DELETE /dns/record/{domain}` | delete a record |
/// | `DELETE /dns/allrecords/{domain}?recordtypes=A` | delete RRsets |
pub fn router(api: DnsApi) -> Router {
    Router::new()
        .route("/dns/zone/{zone_name}", get(get_zone))
        .route(
            "/dns/record/{domain}",
            get(get_record)
                .post(create_record)
                .put(replace_record)
                .delete(delete_record),
        )
        .route("/dns/allrecords/{domain}", delete(delete_record_types))
        .with_state(api)
}

async fn get_zone(
    State(api): State<DnsApi>,
    Path(zone_name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ZoneSnapshot>, ApiError> {
    let snapshot = api.get_zone(api_key(&headers), &zone_name).await?;
    Ok(Json(snapshot))
}

async fn get_record(
    State(api): State<DnsApi>,
    Path(domain): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Json<Resolution>, ApiError> {
    let types = record_types(&params, "record_type")?;
    let records = api.get_records(api_key(&headers), &domain, &types).await?;
    Ok(Json(records))
}

async fn create_record(
    State(api): State<DnsApi>,
    Path(domain): Path<String>,
    headers: HeaderMap,
    Json(record): Json<Record>,
) -> Result<StatusCode, ApiError> {
    api.create_record(api_key(&headers), &domain, record).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn replace_record(
    State(api): State<DnsApi>,
    Path(domain): Path<String>,
    headers: HeaderMap,
    Json(record): Json<Record>,
) -> Result<StatusCode, ApiError> {
    api.replace_record(api_key(&headers), &domain, record).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_record(
    State(api): State<DnsApi>,
    Path(domain): Path<String>,
    headers: HeaderMap,
    Json(record): Json<Record>,
) -> Result<StatusCode, ApiError> {
    api.delete_record(api_key(&headers), &domain, record).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_record_types(
    State(api): State<DnsApi>,
    Path(domain): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let types = record_types(&params, "recordtypes")?;
    api.delete_record_types(api_key(&headers), &domain, &types)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// Collects every value of the repeatable query parameter `key`
fn record_types(params: &[(String, String)], key: &str) -> Result<Vec<RecordType>, ApiError> {
    params
        .iter()
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value.parse().map_err(ApiError::RecordType))
        .collect()
}

/// Failure of a request, rendered as `{"detail": "..."}`
#[derive(Debug)]
pub enum ApiError {
    /// The pipeline rejected or failed the request
    Api(bindapi::Error),
    /// A query string named an unsupported record type
    RecordType(UnknownRecordType),
}

impl From<bindapi::Error> for ApiError {
    fn from(error: bindapi::Error) -> Self {
        Self::Api(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            Self::RecordType(_) => (StatusCode::BAD_REQUEST, "invalid record type"),
            Self::Api(error) => match error.kind() {
                ErrorKind::InvalidApiKey => (StatusCode::UNAUTHORIZED, "invalid api key"),
                ErrorKind::ZoneNotPermitted(_) => {
                    (StatusCode::BAD_REQUEST, "zone file not permitted")
                }
                ErrorKind::DomainNotPermitted(_) => (StatusCode::BAD_REQUEST, "domain not permitted"),
                ErrorKind::DomainZoneNotPermitted(_) => {
                    (StatusCode::BAD_REQUEST, "domain zone not permitted")
                }
                ErrorKind::InvalidRecord { .. } => (StatusCode::BAD_REQUEST, "invalid record data"),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DNS transaction failed - check logs",
                ),
            },
        };

        match &self {
            Self::Api(error) => debug!("request failed with {status}: {error}"),
            Self::RecordType(error) => debug!("request failed with {status}: {error}"),
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
