use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domains::providers::DirectoryFilter;
use crate::kernel::ProviderQuery;
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingSource {
    Emr,
    Fallback,
}

/// `{source, count, items}`
#[derive(Debug, Serialize)]
pub struct Listing<T: Serialize> {
    pub source: ListingSource,
    pub count: usize,
    pub items: Vec<T>,
}

impl<T: Serialize> Listing<T> {
    fn new(source: ListingSource, items: Vec<T>) -> Self {
        Self {
            source,
            count: items.len(),
            items,
        }
    }
}

fn emr_listing(items: Vec<Value>) -> Response {
    Json(Listing::new(ListingSource::Emr, items)).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    #[serde(default)]
    pub prov: Option<String>,
}

/// `GET /api/providers?insurance=&specialty=&location=`
///
/// EMR passthrough when configured and answering, else the local directory.
pub async fn providers_handler(
    Extension(state): Extension<AppState>,
    query: Result<Query<ProviderQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let query = ProviderQuery {
        insurance: trimmed(query.insurance),
        specialty: trimmed(query.specialty),
        location: trimmed(query.location),
    };

    if let Some(emr) = &state.emr {
        if let Some(items) = emr.providers(&query).await {
            return Ok(emr_listing(items));
        }
    }

    let snapshot = state.intake.store().load().await?;
    let filter = DirectoryFilter {
        insurance: query.insurance.as_deref(),
        specialty: query.specialty.as_deref(),
        location: query.location.as_deref(),
    };

    Ok(Json(Listing::new(ListingSource::Fallback, filter.apply(&snapshot.providers))).into_response())
}

/// `GET /api/schedule?prov=`
pub async fn schedule_handler(
    Extension(state): Extension<AppState>,
    query: Result<Query<ScheduleQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let prov = trimmed(query.prov).map(|p| p.to_lowercase());

    if let Some(emr) = &state.emr {
        if let Some(items) = emr.schedule(prov.as_deref()).await {
            return Ok(emr_listing(items));
        }
    }

    let snapshot = state.intake.store().load().await?;
    let items: Vec<_> = snapshot
        .slots
        .iter()
        .filter(|s| prov.as_ref().map_or(true, |p| s.provider_id == *p))
        .collect();

    Ok(Json(Listing::new(ListingSource::Fallback, items)).into_response())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
