use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::records::{MealTypeRecord, RecipeRecord};
use crate::CatalogError;

/// The external catalog service: two independent read endpoints.
///
/// Implementations do IO; [`crate::CatalogSnapshot::load`] requires both
/// reads to succeed.
pub trait CatalogSource {
    fn fetch_meal_types(&self) -> Result<Vec<MealTypeRecord>, CatalogError>;
    fn fetch_recipes(&self) -> Result<Vec<RecipeRecord>, CatalogError>;
}

/// In-memory source (tests, demos, CLI piping).
#[derive(Clone, Debug, Default)]
pub struct StaticCatalogSource {
    pub meal_types: Vec<MealTypeRecord>,
    pub recipes: Vec<RecipeRecord>,
}

impl StaticCatalogSource {
    pub fn new(meal_types: Vec<MealTypeRecord>, recipes: Vec<RecipeRecord>) -> Self {
        Self {
            meal_types,
            recipes,
        }
    }
}

impl CatalogSource for StaticCatalogSource {
    fn fetch_meal_types(&self) -> Result<Vec<MealTypeRecord>, CatalogError> {
        Ok(self.meal_types.clone())
    }

    fn fetch_recipes(&self) -> Result<Vec<RecipeRecord>, CatalogError> {
        Ok(self.recipes.clone())
    }
}

/// On-disk catalog document: `{ "mealTypes": [...], "recipes": [...] }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFile {
    #[serde(alias = "meal_types", alias = "menu")]
    pub meal_types: Vec<MealTypeRecord>,
    pub recipes: Vec<RecipeRecord>,
}

/// Reads a [`CatalogFile`] from disk on every fetch, so a reload picks up
/// edits made by the catalog owner.
#[derive(Clone, Debug)]
pub struct JsonFileCatalogSource {
    path: PathBuf,
}

impl JsonFileCatalogSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<CatalogFile, CatalogError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| CatalogError::Unavailable {
            what: "catalog file",
            detail: format!("{}: {e}", self.path.display()),
        })?;
        serde_json::from_str(&raw).map_err(|e| CatalogError::Unavailable {
            what: "catalog file",
            detail: format!("{}: invalid json: {e}", self.path.display()),
        })
    }
}

impl CatalogSource for JsonFileCatalogSource {
    fn fetch_meal_types(&self) -> Result<Vec<MealTypeRecord>, CatalogError> {
        Ok(self.read()?.meal_types)
    }

    fn fetch_recipes(&self) -> Result<Vec<RecipeRecord>, CatalogError> {
        Ok(self.read()?.recipes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures, CatalogSnapshot};

    #[test]
    fn json_file_source_round_trips_fixture_menu() {
        let snap = fixtures::snapshot();
        let (meal_types, recipes) = snap.to_records();
        let doc = CatalogFile {
            meal_types,
            recipes,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

        let loaded = CatalogSnapshot::load(&JsonFileCatalogSource::new(&path)).unwrap();
        assert_eq!(loaded, snap);
    }

    #[test]
    fn garbage_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "{not json").unwrap();
        let err = CatalogSnapshot::load(&JsonFileCatalogSource::new(&path)).unwrap_err();
        assert!(err.is_unavailable());
    }
}
