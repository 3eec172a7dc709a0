//! Untrusted mutation requests.
//!
//! Payloads come from the kiosk UI or from the conversational agent and are
//! treated as hostile: every field is read individually from a
//! `serde_json::Value`, so one bad line cannot sink its siblings. Both
//! `camelCase` and `snake_case` keys are accepted.

use serde_json::{Map, Value};

use kpos_catalog::{MealSlot, RecipeId};

/// Line quantity as sent. Missing means 1.
#[derive(Clone, Debug, PartialEq)]
pub enum QuantityField {
    Missing,
    Count(u32),
    /// Present but zero, negative, fractional or not a number.
    Invalid(String),
}

impl QuantityField {
    fn read(obj: &Map<String, Value>) -> Self {
        match field(obj, &["quantity", "qty"]) {
            None | Some(Value::Null) => QuantityField::Missing,
            Some(v) => match as_count(v) {
                Some(n) if n >= 1 => QuantityField::Count(n),
                _ => QuantityField::Invalid(v.to_string()),
            },
        }
    }

    /// `Ok(n)` for usable quantities, `Err(raw)` otherwise.
    pub fn resolve(&self) -> Result<u32, String> {
        match self {
            QuantityField::Missing => Ok(1),
            QuantityField::Count(n) => Ok(*n),
            QuantityField::Invalid(raw) => Err(raw.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectionRequest {
    pub recipe_id: Option<RecipeId>,
    /// Advisory only; the catalog name wins.
    pub recipe_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionsRequest {
    pub entrees: Vec<SelectionRequest>,
    pub sides: Vec<SelectionRequest>,
    pub drinks: Vec<SelectionRequest>,
}

impl SelectionsRequest {
    pub fn slot(&self, slot: MealSlot) -> &[SelectionRequest] {
        match slot {
            MealSlot::Entree => &self.entrees,
            MealSlot::Side => &self.sides,
            MealSlot::Drink => &self.drinks,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MealRequest {
    pub meal_type: String,
    pub quantity: QuantityField,
    /// Advisory only; never used for pricing.
    pub price: Option<f64>,
    pub selections: SelectionsRequest,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemRequest {
    pub recipe_id: RecipeId,
    pub recipe_name: Option<String>,
    pub recipe_type: Option<String>,
    pub quantity: QuantityField,
    /// Advisory only; never used for pricing.
    pub price: Option<f64>,
}

/// A request line that could not be read at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalformedLine {
    pub detail: String,
}

impl MalformedLine {
    fn new<S: Into<String>>(detail: S) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AddRequest {
    pub meals: Vec<Result<MealRequest, MalformedLine>>,
    pub individual_items: Vec<Result<ItemRequest, MalformedLine>>,
}

impl AddRequest {
    pub fn is_empty(&self) -> bool {
        self.meals.is_empty() && self.individual_items.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.meals.len() + self.individual_items.len()
    }
}

/// 1-based positions as sent. Non-integer entries are discarded while
/// parsing; zero and negatives survive here and are discarded by bounds
/// checking.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoveRequest {
    pub meal_indices: Vec<i64>,
    pub item_indices: Vec<i64>,
    pub clear_all: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MutationRequest {
    Add(AddRequest),
    Remove(RemoveRequest),
}

/// The payload as a whole was unreadable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalformedRequest(pub String);

impl std::fmt::Display for MalformedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed mutation request: {}", self.0)
    }
}

impl std::error::Error for MalformedRequest {}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl MutationRequest {
    /// Parse raw text (the agent sometimes emits JSON inside a string).
    pub fn parse_str(raw: &str) -> Result<Self, MalformedRequest> {
        let v: Value =
            serde_json::from_str(raw).map_err(|e| MalformedRequest(format!("not json: {e}")))?;
        Self::from_value(&v)
    }

    pub fn from_value(v: &Value) -> Result<Self, MalformedRequest> {
        let obj = match v {
            Value::Object(obj) => obj,
            Value::String(s) => return Self::parse_str(s),
            other => {
                return Err(MalformedRequest(format!(
                    "expected an object, got {}",
                    kind_of(other)
                )))
            }
        };

        let op = field(obj, &["op", "action", "operation"])
            .and_then(Value::as_str)
            .map(|s| s.trim().to_ascii_lowercase());

        match op.as_deref() {
            Some("add") => parse_add(obj).map(MutationRequest::Add),
            Some("remove") | Some("delete") => parse_remove(obj).map(MutationRequest::Remove),
            Some("clear") => Ok(MutationRequest::Remove(RemoveRequest {
                clear_all: true,
                ..RemoveRequest::default()
            })),
            Some(other) => Err(MalformedRequest(format!("unknown op '{other}'"))),
            None if looks_like_remove(obj) => parse_remove(obj).map(MutationRequest::Remove),
            None => parse_add(obj).map(MutationRequest::Add),
        }
    }
}

fn looks_like_remove(obj: &Map<String, Value>) -> bool {
    [
        "mealIndices",
        "meal_indices",
        "itemIndices",
        "item_indices",
        "clearAll",
        "clear_all",
    ]
    .iter()
    .any(|k| obj.contains_key(*k))
}

fn parse_add(obj: &Map<String, Value>) -> Result<AddRequest, MalformedRequest> {
    let meals = match field(obj, &["meals"]) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(arr)) => arr.iter().map(parse_meal).collect(),
        Some(other) => {
            return Err(MalformedRequest(format!(
                "meals must be an array, got {}",
                kind_of(other)
            )))
        }
    };
    let individual_items = match field(obj, &["individualItems", "individual_items", "items"]) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(arr)) => arr.iter().map(parse_item).collect(),
        Some(other) => {
            return Err(MalformedRequest(format!(
                "individualItems must be an array, got {}",
                kind_of(other)
            )))
        }
    };
    Ok(AddRequest {
        meals,
        individual_items,
    })
}

fn parse_meal(v: &Value) -> Result<MealRequest, MalformedLine> {
    let obj = v
        .as_object()
        .ok_or_else(|| MalformedLine::new(format!("meal is {}", kind_of(v))))?;
    let meal_type = field(obj, &["mealType", "meal_type", "type"])
        .and_then(Value::as_str)
        .ok_or_else(|| MalformedLine::new("meal has no mealType"))?
        .to_string();

    let mut selections = SelectionsRequest::default();
    if let Some(Value::Object(sel)) = field(obj, &["selections"]) {
        selections.entrees = parse_selection_list(sel, MealSlot::Entree);
        selections.sides = parse_selection_list(sel, MealSlot::Side);
        selections.drinks = parse_selection_list(sel, MealSlot::Drink);
    }

    Ok(MealRequest {
        meal_type,
        quantity: QuantityField::read(obj),
        price: field(obj, &["price"]).and_then(Value::as_f64),
        selections,
    })
}

fn parse_selection_list(sel: &Map<String, Value>, slot: MealSlot) -> Vec<SelectionRequest> {
    let Some(Value::Array(arr)) = sel.get(slot.key()) else {
        return Vec::new();
    };
    arr.iter()
        .map(|entry| match entry {
            Value::Object(o) => SelectionRequest {
                recipe_id: field(o, &["recipeId", "recipe_id", "id"]).and_then(as_recipe_id),
                recipe_name: field(o, &["recipeName", "recipe_name", "name"])
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            // bare id: `"entrees": [1]`
            other => SelectionRequest {
                recipe_id: as_recipe_id(other),
                recipe_name: None,
            },
        })
        .collect()
}

fn parse_item(v: &Value) -> Result<ItemRequest, MalformedLine> {
    let obj = v
        .as_object()
        .ok_or_else(|| MalformedLine::new(format!("item is {}", kind_of(v))))?;
    let recipe_id = field(obj, &["recipeId", "recipe_id", "id"])
        .and_then(as_recipe_id)
        .ok_or_else(|| MalformedLine::new("item has no usable recipeId"))?;
    Ok(ItemRequest {
        recipe_id,
        recipe_name: field(obj, &["recipeName", "recipe_name", "name"])
            .and_then(Value::as_str)
            .map(str::to_string),
        recipe_type: field(obj, &["recipeType", "recipe_type", "category"])
            .and_then(Value::as_str)
            .map(str::to_string),
        quantity: QuantityField::read(obj),
        price: field(obj, &["price"]).and_then(Value::as_f64),
    })
}

fn parse_remove(obj: &Map<String, Value>) -> Result<RemoveRequest, MalformedRequest> {
    let clear_all = match field(obj, &["clearAll", "clear_all"]) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(MalformedRequest(format!(
                "clearAll must be a boolean, got {}",
                kind_of(other)
            )))
        }
    };
    Ok(RemoveRequest {
        meal_indices: index_list(field(obj, &["mealIndices", "meal_indices"])),
        item_indices: index_list(field(obj, &["itemIndices", "item_indices"])),
        clear_all,
    })
}

fn index_list(v: Option<&Value>) -> Vec<i64> {
    match v {
        Some(Value::Array(arr)) => arr.iter().filter_map(as_index).collect(),
        Some(single) => as_index(single).into_iter().collect(),
        None => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Scalar readers
// ---------------------------------------------------------------------------

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Integer-valued JSON number or digit string.
fn as_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn as_count(v: &Value) -> Option<u32> {
    as_integer(v).and_then(|n| u32::try_from(n).ok())
}

fn as_index(v: &Value) -> Option<i64> {
    as_integer(v)
}

fn as_recipe_id(v: &Value) -> Option<RecipeId> {
    as_integer(v)
        .and_then(|n| u32::try_from(n).ok())
        .map(RecipeId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_is_empty_add() {
        let r = MutationRequest::from_value(&json!({})).unwrap();
        assert_eq!(r, MutationRequest::Add(AddRequest::default()));
    }

    #[test]
    fn remove_inferred_from_keys() {
        let r = MutationRequest::from_value(&json!({ "itemIndices": [1, "3", 2.5] })).unwrap();
        assert_eq!(
            r,
            MutationRequest::Remove(RemoveRequest {
                meal_indices: vec![],
                item_indices: vec![1, 3],
                clear_all: false,
            })
        );
    }

    #[test]
    fn json_inside_string_is_reparsed() {
        let raw = json!("{\"op\":\"clear\"}");
        let r = MutationRequest::from_value(&raw).unwrap();
        assert!(matches!(r, MutationRequest::Remove(RemoveRequest { clear_all: true, .. })));
    }

    #[test]
    fn bad_line_does_not_sink_siblings() {
        let r = MutationRequest::from_value(&json!({
            "individualItems": [
                "rangoon please",
                { "recipeId": 7, "recipeType": "Appetizer", "quantity": 2 },
            ]
        }))
        .unwrap();
        let MutationRequest::Add(add) = r else {
            panic!("expected add");
        };
        assert!(add.individual_items[0].is_err());
        let item = add.individual_items[1].as_ref().unwrap();
        assert_eq!(item.recipe_id, RecipeId(7));
        assert_eq!(item.quantity, QuantityField::Count(2));
    }

    #[test]
    fn quantity_rules() {
        let q = |v: Value| {
            let obj = json!({ "quantity": v });
            QuantityField::read(obj.as_object().unwrap())
        };
        assert_eq!(QuantityField::read(&Map::new()).resolve(), Ok(1));
        assert_eq!(q(json!(3)).resolve(), Ok(3));
        assert_eq!(q(json!(2.0)).resolve(), Ok(2));
        assert!(q(json!(0)).resolve().is_err());
        assert!(q(json!(-1)).resolve().is_err());
        assert!(q(json!(1.5)).resolve().is_err());
        assert!(q(json!("lots")).resolve().is_err());
    }

    #[test]
    fn non_object_top_level_is_malformed() {
        assert!(MutationRequest::from_value(&json!([1, 2])).is_err());
        assert!(MutationRequest::from_value(&json!({ "meals": 5 })).is_err());
        assert!(MutationRequest::parse_str("add a bowl").is_err());
    }

    #[test]
    fn snake_case_keys_accepted() {
        let r = MutationRequest::from_value(&json!({
            "meals": [{
                "meal_type": "Bowl",
                "selections": { "entrees": [{ "recipe_id": 1 }], "sides": [5] }
            }]
        }))
        .unwrap();
        let MutationRequest::Add(add) = r else {
            panic!("expected add");
        };
        let meal = add.meals[0].as_ref().unwrap();
        assert_eq!(meal.meal_type, "Bowl");
        assert_eq!(meal.selections.entrees[0].recipe_id, Some(RecipeId(1)));
        assert_eq!(meal.selections.sides[0].recipe_id, Some(RecipeId(5)));
        assert_eq!(meal.quantity, QuantityField::Missing);
    }
}
