//! Domain entities: core data structures

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identifier of a category as assigned by the API.
pub type CategoryId = i64;

/// Flat category record as delivered by the "list categories" endpoint.
///
/// Only `id` and the parent reference are interpreted. `name` and `name_en`
/// are typed for convenience; every other field stays in `extra` and is
/// written back out unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "name_en")]
    pub name_en: String,
    /// Parent category id, None for root-level categories
    #[serde(
        default,
        rename = "parentCategoryId",
        alias = "parent_category_id",
        alias = "parentCategory",
        alias = "parent_category",
        deserialize_with = "deserialize_parent"
    )]
    pub parent_id: Option<CategoryId>,
    /// Opaque payload (image, icon, goal count, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>, parent_id: Option<CategoryId>) -> Self {
        Self {
            id,
            name: name.into(),
            name_en: String::new(),
            parent_id,
            extra: Map::new(),
        }
    }

    pub fn with_name_en(mut self, name_en: impl Into<String>) -> Self {
        self.name_en = name_en.into();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// The API sends the parent either as a bare id or as a nested category.
#[derive(Deserialize)]
#[serde(untagged)]
enum ParentRef {
    Id(CategoryId),
    Nested { id: CategoryId },
}

fn deserialize_parent<'de, D>(deserializer: D) -> Result<Option<CategoryId>, D::Error>
where
    D: Deserializer<'de>,
{
    let parent = Option::<ParentRef>::deserialize(deserializer)?;
    Ok(parent.map(|p| match p {
        ParentRef::Id(id) | ParentRef::Nested { id } => id,
    }))
}

/// Category with its nested subcategories, ready for menu rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    #[serde(default)]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn leaf(category: Category) -> Self {
        Self {
            category,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> CategoryId {
        self.category.id
    }

    /// Ids of the direct children, in order.
    pub fn child_ids(&self) -> Vec<CategoryId> {
        self.children.iter().map(CategoryNode::id).collect()
    }

    /// Number of nodes in this subtree, including self.
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.children.iter());
        }
        total
    }
}

/// Expand environment variables in a path string.
///
/// Supports:
/// - `$VAR` syntax
/// - `${VAR}` syntax
/// - `~` for home directory
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_bare_parent_id_when_deserializing_then_reads_parent() {
        let cat: Category =
            serde_json::from_value(json!({"id": 2, "name": "Sport", "parentCategoryId": 1}))
                .unwrap();
        assert_eq!(cat.parent_id, Some(1));
    }

    #[test]
    fn given_nested_parent_object_when_deserializing_then_reads_parent_id() {
        let cat: Category = serde_json::from_value(json!({
            "id": 5,
            "name": "Running",
            "nameEn": "running",
            "parentCategory": {"id": 2, "name": "Sport", "nameEn": "sport", "parentCategory": null}
        }))
        .unwrap();
        assert_eq!(cat.parent_id, Some(2));
        assert_eq!(cat.name_en, "running");
        assert!(cat.extra.is_empty());
    }

    #[test]
    fn given_snake_case_payload_when_deserializing_then_accepts_aliases() {
        let cat: Category = serde_json::from_value(json!({
            "id": 7,
            "name": "Книги",
            "name_en": "books",
            "parent_category": null,
            "goal_count": 12
        }))
        .unwrap();
        assert_eq!(cat.parent_id, None);
        assert_eq!(cat.name_en, "books");
        assert_eq!(cat.extra.get("goal_count"), Some(&json!(12)));
    }

    #[test]
    fn given_opaque_fields_when_serializing_then_writes_them_back() {
        let cat = Category::new(3, "Travel", Some(1)).with_field("icon", json!("plane.svg"));
        let value = serde_json::to_value(&cat).unwrap();
        assert_eq!(value["icon"], json!("plane.svg"));
        assert_eq!(value["parentCategoryId"], json!(1));
    }

    #[test]
    fn given_nested_node_when_counting_then_includes_all_descendants() {
        let mut root = CategoryNode::leaf(Category::new(1, "a", None));
        let mut child = CategoryNode::leaf(Category::new(2, "b", Some(1)));
        child
            .children
            .push(CategoryNode::leaf(Category::new(3, "c", Some(2))));
        root.children.push(child);

        assert_eq!(root.count(), 3);
        assert_eq!(root.child_ids(), vec![2]);
    }
}
