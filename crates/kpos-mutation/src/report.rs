use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use kpos_cart::{
    apply_add, apply_removal, AddOutcome, CapacityExceeded, CapacityRejection, Cart, CartLimits,
    LineKind,
};
use kpos_catalog::CatalogSnapshot;
use kpos_pricing::PricingPolicy;

use crate::request::MutationRequest;
use crate::validator::DropReason;
use crate::validator::{validate_add, validate_remove, DroppedLine, Rejection, ValidatedMutation};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Add,
    Remove,
    Clear,
    Noop,
}

/// What a mutation did, plus a sentence the agent can relay verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationReport {
    pub kind: MutationKind,
    pub meals_added: usize,
    pub items_added: usize,
    pub meals_removed: usize,
    pub items_removed: usize,
    pub dropped: Vec<DroppedLine>,
    pub capacity_rejected: Vec<CapacityRejection>,
    pub total_quantity: u64,
    pub message: String,
}

impl MutationReport {
    fn empty(kind: MutationKind, cart: &Cart) -> Self {
        Self {
            kind,
            meals_added: 0,
            items_added: 0,
            meals_removed: 0,
            items_removed: 0,
            dropped: Vec::new(),
            capacity_rejected: Vec::new(),
            total_quantity: cart.total_quantity(),
            message: String::new(),
        }
    }

    /// The cart changed, so the caller must persist it.
    pub fn changed(&self) -> bool {
        self.meals_added + self.items_added + self.meals_removed + self.items_removed > 0
    }
}

/// Escalated outcomes. The cart is untouched in every case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationError {
    Rejected(Rejection),
    Capacity {
        exceeded: CapacityExceeded,
        dropped: Vec<DroppedLine>,
    },
}

impl MutationError {
    /// Customer-facing wording for the agent or kiosk to show.
    pub fn user_message(&self) -> String {
        match self {
            MutationError::Rejected(Rejection::NoValidItems { .. }) => {
                "None of those items could be added. Please choose from the current menu."
                    .to_string()
            }
            MutationError::Rejected(Rejection::EmptyRemovalResult { .. }) => {
                "Nothing was removed. Those item numbers are not in your order.".to_string()
            }
            MutationError::Rejected(Rejection::CatalogUnavailable { .. }) => {
                "The menu is temporarily unavailable. Please try again in a moment.".to_string()
            }
            MutationError::Capacity { exceeded, .. } => format!(
                "Your order is limited to {} items and already has {}. Nothing was added.",
                exceeded.limit, exceeded.current
            ),
        }
    }
}

impl std::fmt::Display for MutationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationError::Rejected(r) => write!(f, "{r}"),
            MutationError::Capacity { exceeded, .. } => write!(f, "{exceeded}"),
        }
    }
}

impl std::error::Error for MutationError {}

impl From<Rejection> for MutationError {
    fn from(r: Rejection) -> Self {
        MutationError::Rejected(r)
    }
}

/// Validate and apply one mutation to `cart`.
///
/// `catalog` is `None` when the snapshot could not be loaded; adds are then
/// refused while removals and clears, which never consult the catalog, still
/// go through.
pub fn apply_mutation(
    request: &MutationRequest,
    catalog: Option<&CatalogSnapshot>,
    cart: &mut Cart,
    policy: &PricingPolicy,
    limits: &CartLimits,
) -> Result<MutationReport, MutationError> {
    let validated = match (request, catalog) {
        (MutationRequest::Add(add), Some(cat)) => validate_add(add, cat, policy)?,
        (MutationRequest::Add(add), None) if add.is_empty() => ValidatedMutation::Noop,
        (MutationRequest::Add(_), None) => {
            warn!("add refused: no catalog snapshot");
            return Err(Rejection::CatalogUnavailable {
                detail: "catalog snapshot not loaded".to_string(),
            }
            .into());
        }
        (MutationRequest::Remove(rm), _) => validate_remove(rm, cart)?,
    };
    execute(validated, cart, limits)
}

/// [`apply_mutation`] over a raw JSON payload. An unreadable payload is
/// `NoValidItems`, same as a request whose every line was dropped.
pub fn apply_payload(
    payload: &serde_json::Value,
    catalog: Option<&CatalogSnapshot>,
    cart: &mut Cart,
    policy: &PricingPolicy,
    limits: &CartLimits,
) -> Result<MutationReport, MutationError> {
    let request = MutationRequest::from_value(payload).map_err(|e| {
        Rejection::NoValidItems {
            dropped: vec![DroppedLine {
                kind: LineKind::Meal,
                position: 0,
                reason: DropReason::Malformed { detail: e.0 },
            }],
        }
    })?;
    apply_mutation(&request, catalog, cart, policy, limits)
}

/// Apply an already-validated mutation.
pub fn execute(
    validated: ValidatedMutation,
    cart: &mut Cart,
    limits: &CartLimits,
) -> Result<MutationReport, MutationError> {
    match validated {
        ValidatedMutation::Noop => {
            let mut r = MutationReport::empty(MutationKind::Noop, cart);
            r.message = "Nothing to change.".to_string();
            Ok(r)
        }
        ValidatedMutation::ClearAll => {
            let meals = cart.meals().len();
            let items = cart.items().len();
            cart.clear();
            info!(meals, items, "cart cleared");
            let mut r = MutationReport::empty(MutationKind::Clear, cart);
            r.meals_removed = meals;
            r.items_removed = items;
            r.message = if meals + items == 0 {
                "Your order is already empty.".to_string()
            } else {
                "Your order has been cleared.".to_string()
            };
            Ok(r)
        }
        ValidatedMutation::Remove(plan) => {
            let out = apply_removal(cart, &plan);
            let mut r = MutationReport::empty(MutationKind::Remove, cart);
            r.meals_removed = out.removed_meals.len();
            r.items_removed = out.removed_items.len();
            r.message = format!("Removed {} line(s) from your order.", out.lines_removed());
            Ok(r)
        }
        ValidatedMutation::Add(add) => {
            let dropped = add.dropped;
            let outcome = match apply_add(cart, add.batch, limits) {
                Ok(o) => o,
                Err(exceeded) => return Err(MutationError::Capacity { exceeded, dropped }),
            };
            let mut r = MutationReport::empty(MutationKind::Add, cart);
            r.message = add_message(&outcome, dropped.len());
            r.meals_added = outcome.meals_added;
            r.items_added = outcome.items_added;
            r.capacity_rejected = outcome.capacity_rejected;
            r.dropped = dropped;
            Ok(r)
        }
    }
}

fn add_message(outcome: &AddOutcome, dropped: usize) -> String {
    let mut msg = format!("Added {} line(s) to your order.", outcome.lines_added());
    if dropped > 0 {
        msg.push_str(&format!(
            " {dropped} line(s) were skipped because they are not on the menu or were incomplete."
        ));
    }
    if !outcome.capacity_rejected.is_empty() {
        msg.push_str(&format!(
            " {} line(s) were not added because an order is limited to {} items.",
            outcome.capacity_rejected.len(),
            outcome.limit
        ));
    }
    msg
}
