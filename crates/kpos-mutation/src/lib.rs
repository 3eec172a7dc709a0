//! kpos-mutation
//!
//! Mutation channel for the cart: the kiosk UI and the conversational agent
//! both send structured add/remove requests through here.
//!
//! Goals:
//! - Field-by-field parsing of untrusted JSON into a typed request
//! - Allow-list validation against the catalog snapshot (drop bad lines,
//!   keep good ones)
//! - Catalog-derived prices only; caller prices are advisory
//! - Distinct escalations: nothing valid, nothing to remove, over capacity
//!
//! No IO. The caller owns the cart and persists it when
//! `MutationReport::changed()` is true.

mod report;
mod request;
mod validator;

pub use report::{apply_mutation, apply_payload, execute, MutationError, MutationKind, MutationReport};
pub use request::{
    AddRequest, ItemRequest, MalformedLine, MalformedRequest, MealRequest, MutationRequest,
    QuantityField, RemoveRequest, SelectionRequest, SelectionsRequest,
};
pub use validator::{
    validate, validate_add, validate_remove, DropReason, DroppedLine, Rejection, ValidatedAdd,
    ValidatedMutation,
};
