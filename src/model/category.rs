//! Category metadata carried alongside the annotation data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ModelError;

/// Category id of masks that have not been labelled yet.
pub const UNDEFINED_ID: i64 = -1;

/// Category id of the temporary mask shown while prompting.
pub const PROMPT_ID: i64 = -2;

/// A COCO-style category entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Unique identifier for the category
    pub id: i64,
    /// Display name of the category
    pub name: String,
    /// Super category name (equal to `name` for user-created categories)
    #[serde(default)]
    pub supercategory: String,
}

impl CategoryEntry {
    /// Create an entry whose super category equals its name.
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            supercategory: name.to_string(),
        }
    }
}

/// All categories of a project, keyed by id.
///
/// Serializes as the plain list of entries used by the project JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CategoryEntry>", into = "Vec<CategoryEntry>")]
pub struct CategoryInfo {
    categories: BTreeMap<i64, CategoryEntry>,
}

impl From<Vec<CategoryEntry>> for CategoryInfo {
    fn from(entries: Vec<CategoryEntry>) -> Self {
        let mut info = Self::default();
        info.update_category_list(entries);
        info
    }
}

impl From<CategoryInfo> for Vec<CategoryEntry> {
    fn from(info: CategoryInfo) -> Self {
        info.categories.into_values().collect()
    }
}

impl CategoryInfo {
    /// Create an empty category set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every category with `entries`. Later duplicates of an id win.
    pub fn update_category_list(&mut self, entries: impl IntoIterator<Item = CategoryEntry>) {
        self.categories = entries.into_iter().map(|e| (e.id, e)).collect();
    }

    /// Categories ordered by id.
    pub fn to_list(&self) -> Vec<CategoryEntry> {
        self.categories.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryEntry> + '_ {
        self.categories.values()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&CategoryEntry> {
        self.categories.get(&id)
    }

    /// Whether masks may reference `id`: a defined category or a reserved id.
    pub fn is_known(&self, id: i64) -> bool {
        id == UNDEFINED_ID || id == PROMPT_ID || self.categories.contains_key(&id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.categories.values().any(|c| c.name == name)
    }

    /// Lowest non-negative id not used by any category.
    pub fn find_available_id(&self) -> i64 {
        (0..)
            .find(|id| !self.categories.contains_key(id))
            .unwrap_or_default()
    }

    /// Add a category, picking the lowest free id when `id` is `None`.
    ///
    /// Returns the id of the new category.
    pub fn add_category(&mut self, name: &str, id: Option<i64>) -> Result<i64, ModelError> {
        if self.contains_name(name) {
            return Err(ModelError::DuplicateCategoryName {
                name: name.to_string(),
            });
        }

        let id = id.unwrap_or_else(|| self.find_available_id());
        self.categories.insert(id, CategoryEntry::new(id, name));
        log::debug!("Added category {} '{}'", id, name);
        Ok(id)
    }

    /// Remove a category, returning it if it existed.
    pub fn remove_category(&mut self, id: i64) -> Option<CategoryEntry> {
        self.categories.remove(&id)
    }

    /// Rename a category and its super category.
    pub fn rename_category(&mut self, id: i64, new_name: &str) -> Result<(), ModelError> {
        let entry = self
            .categories
            .get_mut(&id)
            .ok_or(ModelError::CategoryNotFound { id })?;
        entry.name = new_name.to_string();
        entry.supercategory = new_name.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CategoryInfo {
        CategoryInfo::from(vec![CategoryEntry::new(0, "coral"), CategoryEntry::new(2, "sand")])
    }

    #[test]
    fn test_find_available_id_fills_gaps() {
        let info = sample();
        assert_eq!(info.find_available_id(), 1);
        assert_eq!(CategoryInfo::new().find_available_id(), 0);
    }

    #[test]
    fn test_add_category_rejects_duplicate_names() {
        let mut info = sample();
        assert_eq!(info.add_category("algae", None).unwrap(), 1);
        assert_eq!(info.add_category("rock", Some(7)).unwrap(), 7);
        assert!(matches!(
            info.add_category("coral", None),
            Err(ModelError::DuplicateCategoryName { .. })
        ));
        assert_eq!(info.len(), 4);
    }

    #[test]
    fn test_rename_updates_supercategory() {
        let mut info = sample();
        info.rename_category(2, "rubble").unwrap();
        let entry = info.get(2).unwrap();
        assert_eq!(entry.name, "rubble");
        assert_eq!(entry.supercategory, "rubble");
        assert!(info.rename_category(9, "x").is_err());
    }

    #[test]
    fn test_reserved_ids_are_known() {
        let info = sample();
        assert!(info.is_known(UNDEFINED_ID));
        assert!(info.is_known(PROMPT_ID));
        assert!(info.is_known(2));
        assert!(!info.is_known(1));
    }

    #[test]
    fn test_serializes_as_list() {
        let info = sample();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json[0]["name"], "coral");
        assert_eq!(json[1]["id"], 2);

        let back: CategoryInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);
    }
}
