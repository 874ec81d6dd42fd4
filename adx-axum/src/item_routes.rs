//! REST API endpoints listing the bids of an ad unit or ad slot.

use crate::ApiApplication;
use adx_core::models::{AdslotId, AdunitId, BidId, BidState};
use aide::axum::{ApiRouter, routing::get};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use schemars::JsonSchema;
use serde::Deserialize;

/// Creates a router listing the bids placed on ad units.
pub fn adunit_router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new().api_route_with("/{adunit_id}/bids", get(adunit_bids::<T>), |route| {
        route.tag("query")
    })
}

/// Creates a router listing the bids accepted into ad slots.
pub fn adslot_router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new().api_route_with("/{adslot_id}/bids", get(adslot_bids::<T>), |route| {
        route.tag("query")
    })
}

#[derive(Deserialize, JsonSchema)]
#[schemars(inline)]
struct AdunitPath {
    /// The ad unit
    adunit_id: AdunitId,
}

#[derive(Deserialize, JsonSchema)]
#[schemars(inline)]
struct AdslotPath {
    /// The ad slot
    adslot_id: AdslotId,
}

/// Optional state filter for bid listings.
#[derive(Deserialize, JsonSchema)]
#[schemars(inline)]
struct StateFilter {
    /// Only list bids currently in this state
    state: Option<BidState>,
}

/// List the bids placed on an ad unit, in creation order.
///
/// An unknown ad unit simply has no bids.
async fn adunit_bids<T: ApiApplication>(
    State(app): State<T>,
    Path(AdunitPath { adunit_id }): Path<AdunitPath>,
    Query(StateFilter { state }): Query<StateFilter>,
) -> Json<Vec<BidId>> {
    let exchange = app.exchange().lock();
    Json(match state {
        Some(state) => exchange.get_bids_by_adunit(adunit_id, state),
        None => exchange.get_all_bids_by_adunit(adunit_id).to_vec(),
    })
}

/// List the bids accepted into an ad slot, in acceptance order.
async fn adslot_bids<T: ApiApplication>(
    State(app): State<T>,
    Path(AdslotPath { adslot_id }): Path<AdslotPath>,
    Query(StateFilter { state }): Query<StateFilter>,
) -> Json<Vec<BidId>> {
    let exchange = app.exchange().lock();
    Json(match state {
        Some(state) => exchange.get_bids_by_adslot(adslot_id, state),
        None => exchange.get_all_bids_by_adslot(adslot_id).to_vec(),
    })
}
