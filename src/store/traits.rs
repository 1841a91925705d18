//! Store session trait.

use super::response::{GraphQlRequest, GraphQlResponse};
use crate::error::Result;
use std::sync::Arc;

/// A connection to the graph store.
///
/// `submit` returns `Ok` whenever the store answered, including answers that
/// carry GraphQL errors; `Err` is reserved for transport failures. The
/// mutation client owns the interpretation of store-reported errors.
///
/// ```ignore
/// use threat_db::store::{GraphQlSession, MutationClient, StoreSession};
///
/// let session = GraphQlSession::new(config)?;
/// if !session.is_alive() {
///     tracing::warn!("{} is not reachable", session.name());
/// }
/// let client = MutationClient::new(session);
/// ```
pub trait StoreSession: Send + Sync {
    /// Send one GraphQL request.
    fn submit(&self, request: &GraphQlRequest) -> Result<GraphQlResponse>;

    /// Liveness probe. Never fails; an unreachable store is simply not alive.
    fn is_alive(&self) -> bool;

    /// Name of the backend, for logs.
    fn name(&self) -> &str;
}

impl<S: StoreSession + ?Sized> StoreSession for Arc<S> {
    fn submit(&self, request: &GraphQlRequest) -> Result<GraphQlResponse> {
        (**self).submit(request)
    }

    fn is_alive(&self) -> bool {
        (**self).is_alive()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<S: StoreSession + ?Sized> StoreSession for Box<S> {
    fn submit(&self, request: &GraphQlRequest) -> Result<GraphQlResponse> {
        (**self).submit(request)
    }

    fn is_alive(&self) -> bool {
        (**self).is_alive()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
