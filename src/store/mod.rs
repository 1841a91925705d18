//! Graph store access.
//!
//! [`MutationClient`] submits a [`CanonicalBom`](crate::model::CanonicalBom)
//! as one `addBom` mutation through any [`StoreSession`]. The production
//! session is [`GraphQlSession`], which talks GraphQL over HTTP to a Dgraph
//! alpha.
//!
//! Store-reported errors are classified by [`classify`]:
//!
//! | Message contains | Outcome |
//! |---|---|
//! | `couldn't commit transaction` + `Please retry` | retried, then failure |
//! | `duplicate XID found` | success, unchanged |
//! | `already exists for field serialNumber inside type Bom` | success, unchanged |
//! | `Non-nullable field 'timestamp'` / `'serialNumber'` | success, unchanged |
//! | anything else | failure |

mod client;
mod graphql;
mod response;
mod traits;

pub use client::{add_bom_request, MutationClient, SubmitOutcome, ADD_BOM_MUTATION, ADD_BOM_PAYLOAD};
pub use graphql::{
    graphql_endpoint, health_endpoint, GraphQlSession, GraphQlSessionConfig, DEFAULT_ENDPOINT,
};
pub use response::{
    classify, BenignRejection, ErrorClass, GraphQlError, GraphQlRequest, GraphQlResponse,
};
pub use traits::StoreSession;
