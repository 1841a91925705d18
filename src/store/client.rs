//! Mutation client: submits canonical BOMs and interprets store errors.

use super::response::{classify, BenignRejection, ErrorClass, GraphQlRequest, GraphQlResponse};
use super::traits::StoreSession;
use crate::error::{ErrorContext, Result, StoreErrorKind, ThreatDbError};
use crate::model::CanonicalBom;
use serde_json::{Map, Value};

/// Create-only mutation; the store materializes all nested objects in one
/// transaction.
pub const ADD_BOM_MUTATION: &str = "mutation AddBom($input: [AddBomInput!]!) { addBom(input: $input, upsert: false) { bom { serialNumber } } }";

/// Root field expected in a successful response.
pub const ADD_BOM_PAYLOAD: &str = "addBom";

/// What a successful submission did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The store created the document
    Created { serial_numbers: Vec<String> },
    /// The store already held the desired state
    Unchanged(BenignRejection),
}

impl SubmitOutcome {
    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

/// Issues `addBom` mutations with a bounded retry on transaction conflicts.
#[derive(Debug)]
pub struct MutationClient<S> {
    session: S,
    conflict_retries: u32,
}

impl<S: StoreSession> MutationClient<S> {
    /// Create a client that retries a conflicting mutation once.
    pub fn new(session: S) -> Self {
        Self {
            session,
            conflict_retries: 1,
        }
    }

    #[must_use]
    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn is_alive(&self) -> bool {
        self.session.is_alive()
    }

    /// Submit one canonical BOM.
    ///
    /// Benign rejections come back as [`SubmitOutcome::Unchanged`]. A
    /// conflict that survives the retries, any other store error, and a
    /// response without the `addBom` payload are errors.
    pub fn create_bom(&self, bom: &CanonicalBom) -> Result<SubmitOutcome> {
        let request = add_bom_request(bom)?;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let response = self
                .session
                .submit(&request)
                .with_context(|| format!("submitting {}", bom.serial_number))?;

            let Some(message) = response.first_error() else {
                return created(&response, &bom.serial_number);
            };

            match classify(message) {
                ErrorClass::Transient if attempts <= self.conflict_retries => {
                    tracing::info!(serial_number = %bom.serial_number, "Retrying failed mutation");
                }
                ErrorClass::Transient => {
                    return Err(ThreatDbError::store(
                        format!("submitting {}", bom.serial_number),
                        StoreErrorKind::ConflictPersisted {
                            attempts,
                            message: message.to_string(),
                        },
                    ));
                }
                ErrorClass::Benign(kind) => {
                    tracing::info!(serial_number = %bom.serial_number, "{kind}");
                    return Ok(SubmitOutcome::Unchanged(kind));
                }
                ErrorClass::Fatal => {
                    return Err(ThreatDbError::store(
                        format!("submitting {}", bom.serial_number),
                        StoreErrorKind::Rejected(message.to_string()),
                    ));
                }
            }
        }
    }
}

/// Build the `addBom` request with a single-element input list.
pub fn add_bom_request(bom: &CanonicalBom) -> Result<GraphQlRequest> {
    let input = serde_json::to_value(std::slice::from_ref(bom))?;
    let mut variables = Map::new();
    variables.insert("input".to_string(), input);
    Ok(GraphQlRequest::new(ADD_BOM_MUTATION, Value::Object(variables)))
}

fn created(response: &GraphQlResponse, serial_number: &str) -> Result<SubmitOutcome> {
    let payload = response.root_payload(ADD_BOM_PAYLOAD).ok_or_else(|| {
        ThreatDbError::store(
            format!("submitting {serial_number}"),
            StoreErrorKind::MissingPayload(ADD_BOM_PAYLOAD.to_string()),
        )
    })?;

    let serial_numbers = payload
        .get("bom")
        .and_then(Value::as_array)
        .map(|boms| {
            boms.iter()
                .filter_map(|b| b.get("serialNumber").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(SubmitOutcome::Created { serial_numbers })
}
