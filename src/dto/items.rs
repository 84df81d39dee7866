use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    category_tree::CategoryTree,
    models::Item,
    validation::{Validate, ValidationErrors},
};

/// Body of both item create and item edit; an edit replaces every field.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ItemRequest {
    pub name: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    pub description: String,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub technical_details: BTreeMap<String, String>,
}

impl ItemRequest {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            price: self.price,
            description: self.description.trim().to_string(),
            category: self
                .category
                .into_iter()
                .map(|segment| segment.trim().to_string())
                .collect(),
            technical_details: self.technical_details,
        }
    }
}

impl Validate for ItemRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_length("name", &self.name, 2, None);
        errors.check_price("price", self.price);
        errors.check_length("description", &self.description, 25, Some(5000));
        errors.check_segments("category", &self.category);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
    /// Keep relevance order (with a search) or insertion order.
    #[default]
    #[serde(rename = "")]
    Unset,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ItemFilter {
    #[schema(value_type = Option<String>)]
    pub price_min: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub price_max: Option<Decimal>,
    pub search_query: Option<String>,
    /// Items must carry every listed segment.
    pub category: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ItemsQuery {
    /// One of `id`, `name`, `price`.
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default)]
    pub sort: SortDirection,
    /// Fetch exactly these items; filter, sort and pagination are skipped.
    pub items: Option<Vec<Uuid>>,
    #[serde(default)]
    pub filter: ItemFilter,
    pub per_page: i64,
    /// Zero-based.
    pub page: i64,
}

fn default_sort_by() -> String {
    "id".to_string()
}

impl Default for ItemsQuery {
    fn default() -> Self {
        Self {
            sort_by: default_sort_by(),
            sort: SortDirection::Unset,
            items: None,
            filter: ItemFilter::default(),
            per_page: 20,
            page: 0,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemList {
    pub items: Vec<Item>,
    pub pages: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryTreeResponse {
    #[schema(value_type = Object)]
    pub tree: CategoryTree,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> ItemRequest {
        ItemRequest {
            name: " Pixel 9 ".into(),
            price: Decimal::new(79900, 2),
            description: "  A phone with a very good camera and battery.  ".into(),
            category: vec![" Electronics ".into(), "Phones".into()],
            technical_details: BTreeMap::from([("ram".to_string(), "12GB".to_string())]),
        }
    }

    #[test]
    fn normalized_item_is_valid() {
        let req = item().normalized();
        assert_eq!(req.name, "Pixel 9");
        assert_eq!(req.category, vec!["Electronics", "Phones"]);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn item_violations_are_listed() {
        let req = ItemRequest {
            name: "X".into(),
            price: Decimal::ZERO,
            description: "too short".into(),
            category: vec!["Electronics".into(), "".into()],
            ..item()
        };
        let err = req.validate().unwrap_err();
        let fields: Vec<&str> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "price", "description", "category[1]"]);
    }

    #[test]
    fn price_beyond_column_range_is_invalid() {
        let req = ItemRequest {
            price: Decimal::new(100_000_000_000, 0),
            ..item()
        }
        .normalized();
        let err = req.validate().unwrap_err();
        assert!(err.has_field("price"));
        assert_eq!(err.errors.len(), 1);
    }

    #[test]
    fn query_defaults_from_json() {
        let query: ItemsQuery =
            serde_json::from_str(r#"{"per_page": 10, "page": 0}"#).unwrap();
        assert_eq!(query.sort_by, "id");
        assert_eq!(query.sort, SortDirection::Unset);
        assert!(query.items.is_none());
        assert!(query.filter.category.is_none());
    }

    #[test]
    fn query_parses_nested_filter() {
        let query: ItemsQuery = serde_json::from_str(
            r#"{
                "sort_by": "price",
                "sort": "desc",
                "filter": {"price_min": 10, "price_max": "99.50", "category": ["X", "Y"]},
                "per_page": 5,
                "page": 1
            }"#,
        )
        .unwrap();
        assert_eq!(query.sort, SortDirection::Desc);
        assert_eq!(query.filter.price_min, Some(Decimal::new(10, 0)));
        assert_eq!(query.filter.price_max, Some(Decimal::new(9950, 2)));
        assert_eq!(query.filter.category.unwrap(), vec!["X", "Y"]);
    }

    #[test]
    fn empty_sort_string_means_unset() {
        let query: ItemsQuery =
            serde_json::from_str(r#"{"sort": "", "per_page": 1, "page": 0}"#).unwrap();
        assert_eq!(query.sort, SortDirection::Unset);
    }
}
