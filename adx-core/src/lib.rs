#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

/// Core domain models for the bid exchange.
///
/// This module contains the bid record, its lifecycle states, the strongly-typed
/// identifiers and byte values it references, and the notifications emitted on
/// each transition. The models carry no business logic beyond what is needed to
/// describe the lifecycle graph; enforcement lives with the exchange.
pub mod models;

/// Interface traits for the collaborators of the exchange.
///
/// These are the "ports" of the hexagonal architecture: the item registry, the
/// token ledger and the clock. The exchange consumes them and adapters (in-memory,
/// RPC-backed, ...) implement them.
pub mod ports;
