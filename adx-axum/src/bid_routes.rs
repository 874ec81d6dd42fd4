//! REST API endpoints for the bid lifecycle.
//!
//! Every mutating endpoint identifies the caller from the bearer token and
//! then runs exactly one exchange operation. Successful responses carry the
//! notification the operation produced.

use crate::{ApiApplication, caller, rejection};
use adx_core::models::{
    AdslotId, Amount, Bid, BidAccepted, BidCanceled, BidCompleted, BidEvent, BidExpired, BidId,
    BidOffer, BidOpened, BidRewardClaimed, Report,
};
use aide::axum::{
    ApiRouter,
    routing::{get, post},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::{Stream, StreamExt as _, wrappers::BroadcastStream};
use tracing::{Level, event};

/// Creates a router with bid-related endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with("/", post(place_bid::<T>), |route| {
            route.security_requirement("jwt").tag("bid")
        })
        .route("/events", axum::routing::get(bid_events::<T>))
        .api_route_with("/{bid_id}", get(get_bid::<T>), |route| route.tag("query"))
        .api_route_with("/{bid_id}/reports", get(get_bid_reports::<T>), |route| {
            route.tag("query")
        })
        .api_route_with("/{bid_id}/escrow", get(get_escrow::<T>), |route| {
            route.tag("query")
        })
        .api_route_with("/{bid_id}/cancel", post(cancel_bid::<T>), |route| {
            route.security_requirement("jwt").tag("bid")
        })
        .api_route_with("/{bid_id}/accept", post(accept_bid::<T>), |route| {
            route.security_requirement("jwt").tag("bid")
        })
        .api_route_with("/{bid_id}/verify", post(verify_bid::<T>), |route| {
            route.security_requirement("jwt").tag("bid")
        })
        .api_route_with("/{bid_id}/claim", post(claim_bid_reward::<T>), |route| {
            route.security_requirement("jwt").tag("bid")
        })
        .api_route_with("/{bid_id}/refund", post(refund_bid::<T>), |route| {
            route.security_requirement("jwt").tag("bid")
        })
        .api_route_with("/{bid_id}/giveup", post(giveup_bid::<T>), |route| {
            route.security_requirement("jwt").tag("bid")
        })
}

/// Path parameter for bid-specific endpoints.
#[derive(Deserialize, JsonSchema)]
#[schemars(inline)]
struct Id {
    /// The id of the bid
    bid_id: BidId,
}

/// Request body for accepting a bid.
#[derive(Deserialize, JsonSchema)]
struct AcceptBody {
    /// The ad slot to bind; the caller must own it
    adslot_id: AdslotId,
    /// Opaque contact or delivery endpoint of the publisher
    #[serde(default)]
    publisher_peer: String,
}

/// Request body for attesting delivery.
#[derive(Deserialize, JsonSchema)]
struct VerifyBody {
    /// The caller's attestation
    report: Report,
}

/// Response to an attestation.
#[derive(Serialize, JsonSchema)]
struct VerifyResponse {
    /// Present when this attestation completed the bid
    completed: Option<BidCompleted>,
}

/// The two attestations of a bid.
#[derive(Serialize, JsonSchema)]
struct ReportsResponse {
    adv_report: Option<Report>,
    pub_report: Option<Report>,
}

/// How much of the custody balance belongs to a bid.
#[derive(Serialize, JsonSchema)]
struct EscrowResponse {
    bid_id: BidId,
    escrow_held: Amount,
}

/// Open a new bid on one of the caller's ad units.
///
/// # Returns
///
/// - `201 Created`: The bid was opened and its reward escrowed
/// - `401 Unauthorized`: The token does not identify an account
/// - `402 Payment Required`: The reward could not be pulled from the wallet
/// - `403 Forbidden`: The caller does not own the ad unit
/// - `404 Not Found`: Unknown ad unit, or the owner has no payout wallet
async fn place_bid<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(offer): Json<BidOffer>,
) -> Result<(StatusCode, Json<BidOpened>), (StatusCode, String)> {
    let caller = caller(&app, &auth).await?;
    let opened = app
        .exchange()
        .lock()
        .place_bid(&caller, offer)
        .map_err(rejection)?;
    Ok((StatusCode::CREATED, Json(opened)))
}

/// Retrieve the full record of a bid.
async fn get_bid<T: ApiApplication>(
    State(app): State<T>,
    Path(Id { bid_id }): Path<Id>,
) -> Result<Json<Bid>, (StatusCode, String)> {
    let exchange = app.exchange().lock();
    exchange
        .get_bid(bid_id)
        .map(|bid| Json(bid.clone()))
        .map_err(rejection)
}

/// Retrieve the advertiser's and the publisher's attestations.
async fn get_bid_reports<T: ApiApplication>(
    State(app): State<T>,
    Path(Id { bid_id }): Path<Id>,
) -> Result<Json<ReportsResponse>, (StatusCode, String)> {
    let (adv_report, pub_report) = app
        .exchange()
        .lock()
        .get_bid_reports(bid_id)
        .map_err(rejection)?;
    Ok(Json(ReportsResponse {
        adv_report,
        pub_report,
    }))
}

/// Retrieve the escrow a bid currently holds.
async fn get_escrow<T: ApiApplication>(
    State(app): State<T>,
    Path(Id { bid_id }): Path<Id>,
) -> Result<Json<EscrowResponse>, (StatusCode, String)> {
    let escrow_held = app
        .exchange()
        .lock()
        .escrow_held(bid_id)
        .map_err(rejection)?;
    Ok(Json(EscrowResponse {
        bid_id,
        escrow_held,
    }))
}

/// Withdraw an open bid; the advertiser is refunded.
async fn cancel_bid<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { bid_id }): Path<Id>,
) -> Result<Json<BidCanceled>, (StatusCode, String)> {
    let caller = caller(&app, &auth).await?;
    app.exchange()
        .lock()
        .cancel_bid(&caller, bid_id)
        .map(Json)
        .map_err(rejection)
}

/// Accept an open bid into one of the caller's ad slots.
async fn accept_bid<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { bid_id }): Path<Id>,
    Json(body): Json<AcceptBody>,
) -> Result<Json<BidAccepted>, (StatusCode, String)> {
    let caller = caller(&app, &auth).await?;
    app.exchange()
        .lock()
        .accept_bid(&caller, bid_id, body.adslot_id, body.publisher_peer)
        .map(Json)
        .map_err(rejection)
}

/// Attach the caller's attestation to an accepted bid.
///
/// The response carries the completion notice when this was the second of
/// the two attestations.
async fn verify_bid<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { bid_id }): Path<Id>,
    Json(body): Json<VerifyBody>,
) -> Result<Json<VerifyResponse>, (StatusCode, String)> {
    let caller = caller(&app, &auth).await?;
    let completed = app
        .exchange()
        .lock()
        .verify_bid(&caller, bid_id, body.report)
        .map_err(rejection)?;
    Ok(Json(VerifyResponse { completed }))
}

/// Pay the reward of a completed bid to the publisher's wallet.
async fn claim_bid_reward<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { bid_id }): Path<Id>,
) -> Result<Json<BidRewardClaimed>, (StatusCode, String)> {
    let caller = caller(&app, &auth).await?;
    app.exchange()
        .lock()
        .claim_bid_reward(&caller, bid_id)
        .map(Json)
        .map_err(rejection)
}

/// Refund an accepted bid whose timeout has elapsed.
async fn refund_bid<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { bid_id }): Path<Id>,
) -> Result<Json<BidExpired>, (StatusCode, String)> {
    let caller = caller(&app, &auth).await?;
    app.exchange()
        .lock()
        .refund_bid(&caller, bid_id)
        .map(Json)
        .map_err(rejection)
}

/// Release an accepted bid as its publisher; the advertiser is refunded.
async fn giveup_bid<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { bid_id }): Path<Id>,
) -> Result<Json<BidCanceled>, (StatusCode, String)> {
    let caller = caller(&app, &auth).await?;
    app.exchange()
        .lock()
        .giveup_bid(&caller, bid_id)
        .map(Json)
        .map_err(rejection)
}

/// Stream every notification as a server-sent event.
///
/// The event name is the notification's name and the data is its JSON body.
/// A client that falls too far behind receives a `lagged` event carrying the
/// number of notifications it missed.
async fn bid_events<T: ApiApplication>(
    State(app): State<T>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(app.exchange().subscribe()).map(|received| {
        Ok(match received {
            Ok(notification) => sse_event(&notification),
            Err(lagged) => Event::default().event("lagged").data(lagged.to_string()),
        })
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn sse_event(notification: &BidEvent) -> Event {
    let header = || {
        Event::default()
            .event(notification.name())
            .id(notification.bid_id().to_string())
    };
    header().json_data(notification).unwrap_or_else(|err| {
        event!(Level::ERROR, err = err.to_string(), "failed to encode notification");
        header().comment("unencodable notification")
    })
}
