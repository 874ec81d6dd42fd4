//! Endpoints for the in-memory registry and token ledger.
//!
//! A deployed exchange would talk to an external registry and token contract;
//! the demo serves both itself so that a client can run a whole bid lifecycle
//! against one server.

use crate::impls::DemoApp;
use adx_core::models::{Address, Amount, ContentId, Item, ItemKind};
use adx_memory::{Account, ItemRecord, LedgerError, RegistryError};
use aide::axum::{
    ApiRouter,
    routing::{get, post},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{Level, event};

/// The registry and ledger endpoints, to serve next to the exchange.
pub fn router() -> ApiRouter<DemoApp> {
    ApiRouter::new()
        .nest("/registry", registry_router())
        .nest("/ledger", ledger_router())
}

fn registry_router() -> ApiRouter<DemoApp> {
    ApiRouter::new()
        .api_route_with("/account", post(register_account), |route| {
            route.security_requirement("jwt").tag("registry")
        })
        .api_route_with("/account/{address}", get(get_account), |route| {
            route.tag("registry")
        })
        .api_route_with("/item", post(register_item), |route| {
            route.security_requirement("jwt").tag("registry")
        })
        .api_route_with("/item/{kind}/{id}", get(get_item), |route| {
            route.tag("registry")
        })
}

fn ledger_router() -> ApiRouter<DemoApp> {
    ApiRouter::new()
        .api_route_with("/balance/{address}", get(get_balance), |route| {
            route.tag("ledger")
        })
        .api_route_with("/approve", post(approve), |route| {
            route.security_requirement("jwt").tag("ledger")
        })
        .api_route_with("/transfer", post(transfer), |route| {
            route.security_requirement("jwt").tag("ledger")
        })
        .api_route_with("/mint", post(mint), |route| {
            route.security_requirement("jwt").tag("ledger")
        })
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

fn caller(app: &DemoApp, auth: &Authorization<Bearer>) -> Result<Address, (StatusCode, String)> {
    app.subject(auth)
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, "not authorized".to_string()))
}

fn registry_rejection(err: RegistryError) -> (StatusCode, String) {
    let status = match err {
        RegistryError::NoAccount(_) | RegistryError::NotOwner { .. } => StatusCode::FORBIDDEN,
        RegistryError::UnknownItem(_) => StatusCode::NOT_FOUND,
    };
    event!(Level::DEBUG, %status, err = err.to_string(), "registry write rejected");
    (status, err.to_string())
}

fn ledger_rejection(err: LedgerError) -> (StatusCode, String) {
    let status = match err {
        LedgerError::InsufficientBalance { .. } | LedgerError::InsufficientAllowance { .. } => {
            StatusCode::PAYMENT_REQUIRED
        }
        LedgerError::Overflow(_) => StatusCode::CONFLICT,
    };
    event!(Level::DEBUG, %status, err = err.to_string(), "ledger call rejected");
    (status, err.to_string())
}

/// Path parameter naming an account.
#[derive(Deserialize, JsonSchema)]
#[schemars(inline)]
struct AddressPath {
    /// The account address
    address: Address,
}

/// Path parameters naming an item.
#[derive(Deserialize, JsonSchema)]
#[schemars(inline)]
struct ItemPath {
    /// `ad_unit` or `ad_slot`
    kind: ItemKind,
    /// The id within the kind's id space
    id: u64,
}

/// Request body for registering the caller as an account.
#[derive(Deserialize, JsonSchema)]
struct AccountBody {
    /// A display name
    #[serde(default)]
    name: String,
    /// Where payouts go (defaults to the caller)
    wallet: Option<Address>,
    /// Content id of the public profile
    ipfs: Option<ContentId>,
    /// Free-form metadata
    #[serde(default)]
    meta: String,
}

/// Request body for creating or updating an item.
#[derive(Deserialize, JsonSchema)]
struct ItemBody {
    /// `ad_unit` or `ad_slot`
    kind: ItemKind,
    /// 0 to create a new item, otherwise the item to update
    #[serde(default)]
    id: u64,
    /// Content id of the item's description
    ipfs: ContentId,
    /// A display name
    #[serde(default)]
    name: String,
    /// Free-form metadata
    #[serde(default)]
    meta: String,
}

/// Request body for authorizing a spender.
#[derive(Deserialize, JsonSchema)]
struct ApproveBody {
    /// Who may spend (defaults to the exchange's custody account)
    spender: Option<Address>,
    /// The new allowance, replacing any previous one
    amount: Amount,
}

/// Request body for moving tokens.
#[derive(Deserialize, JsonSchema)]
struct TransferBody {
    /// The credited account
    to: Address,
    /// How much to move
    amount: Amount,
}

/// A balance on the ledger.
#[derive(Serialize, JsonSchema)]
struct BalanceResponse {
    address: Address,
    balance: Amount,
}

/// An allowance on the ledger.
#[derive(Serialize, JsonSchema)]
struct AllowanceResponse {
    owner: Address,
    spender: Address,
    allowance: Amount,
}

/// Register the caller as an account, or update its details.
async fn register_account(
    State(app): State<DemoApp>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<AccountBody>,
) -> ApiResult<Account> {
    let caller = caller(&app, &auth)?;
    Ok(Json(app.registry.register(
        caller,
        body.name,
        body.wallet.unwrap_or(caller),
        body.ipfs.unwrap_or(ContentId([0; 32])),
        body.meta,
    )))
}

/// Retrieve an account.
async fn get_account(
    State(app): State<DemoApp>,
    Path(AddressPath { address }): Path<AddressPath>,
) -> ApiResult<Account> {
    app.registry
        .account(&address)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("{address} has no account")))
}

/// Create or update an ad unit or ad slot owned by the caller.
///
/// # Returns
///
/// - `200 OK`: The item as stored, including its (new) id
/// - `401 Unauthorized`: The token does not identify an account
/// - `403 Forbidden`: The caller is not registered, or does not own the item
/// - `404 Not Found`: The item to update does not exist
async fn register_item(
    State(app): State<DemoApp>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<ItemBody>,
) -> ApiResult<ItemRecord> {
    let caller = caller(&app, &auth)?;
    app.registry
        .register_item(caller, body.kind, body.id, body.ipfs, body.name, body.meta)
        .map(Json)
        .map_err(registry_rejection)
}

/// Retrieve an item.
async fn get_item(
    State(app): State<DemoApp>,
    Path(ItemPath { kind, id }): Path<ItemPath>,
) -> ApiResult<ItemRecord> {
    let item = Item::new(kind, id);
    app.registry
        .item(item)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown {item}")))
}

/// Retrieve the balance of an account.
async fn get_balance(
    State(app): State<DemoApp>,
    Path(AddressPath { address }): Path<AddressPath>,
) -> Json<BalanceResponse> {
    Json(BalanceResponse {
        address,
        balance: app.ledger.balance_of(&address),
    })
}

/// Set how much a spender may pull from the caller.
///
/// Bids are funded by pulling the reward from the advertiser's wallet, so the
/// wallet must first approve the custody account.
async fn approve(
    State(app): State<DemoApp>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<ApproveBody>,
) -> ApiResult<AllowanceResponse> {
    let owner = caller(&app, &auth)?;
    let spender = body.spender.unwrap_or(app.custody);
    app.ledger.approve(&owner, &spender, body.amount);
    Ok(Json(AllowanceResponse {
        owner,
        spender,
        allowance: app.ledger.allowance(&owner, &spender),
    }))
}

/// Move tokens from the caller to another account.
async fn transfer(
    State(app): State<DemoApp>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<TransferBody>,
) -> ApiResult<BalanceResponse> {
    let from = caller(&app, &auth)?;
    app.ledger
        .transfer(&from, &body.to, body.amount)
        .map_err(ledger_rejection)?;
    Ok(Json(BalanceResponse {
        address: from,
        balance: app.ledger.balance_of(&from),
    }))
}

/// Create tokens out of thin air. Requires an `admin: true` claim.
async fn mint(
    State(app): State<DemoApp>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<TransferBody>,
) -> ApiResult<BalanceResponse> {
    if !app.is_admin(&auth) {
        return Err((StatusCode::FORBIDDEN, "admin claim required".to_string()));
    }
    let balance = app
        .ledger
        .mint(&body.to, body.amount)
        .map_err(ledger_rejection)?;
    Ok(Json(BalanceResponse {
        address: body.to,
        balance,
    }))
}
