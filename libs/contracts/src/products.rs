use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::serde_helpers::comma_separated;

/// Catalog entry as returned by the product service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductDto {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Price in cents
    pub price: i64,
    pub stock_quantity: i32,
    pub category: String,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub is_active: bool,
    /// Active and stock above zero
    pub is_in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price in cents
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock_quantity: i32,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[serde(default)]
    #[validate(custom(function = "list_items"))]
    pub tags: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "list_items"))]
    pub image_urls: Vec<String>,
}

/// Tags and image URLs are stored comma-joined, so items must be non-empty, comma-free
/// and already trimmed.
fn list_items(items: &[String]) -> Result<(), ValidationError> {
    let valid = items
        .iter()
        .all(|item| !item.is_empty() && !item.contains(',') && item.trim() == item);
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("list_item")
            .with_message("items must be non-empty, trimmed and free of commas".into()))
    }
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    pub stock_quantity: Option<i32>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(custom(function = "list_items"))]
    pub tags: Option<Vec<String>>,
    #[validate(custom(function = "list_items"))]
    pub image_urls: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Sets the absolute stock level; negatives are rejected by the product.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStockRequest {
    pub quantity: i32,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductSortField {
    Name,
    Price,
    CreatedAt,
    StockQuantity,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

/// Catalog search, read from the query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductSearchRequest {
    /// Case-insensitive match on name or description
    pub search_term: Option<String>,
    pub category: Option<String>,
    /// Inclusive lower bound, in cents
    pub min_price: Option<i64>,
    /// Inclusive upper bound, in cents
    pub max_price: Option<i64>,
    /// Comma-separated; a product matches if it has any of them
    #[serde(default, deserialize_with = "comma_separated")]
    #[param(value_type = Option<String>)]
    pub tags: Vec<String>,
    pub in_stock: Option<bool>,
    #[serde(default = "default_page")]
    #[validate(range(min = 1, max = 1000000))]
    pub page: u64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: u64,
    pub sort_by: Option<ProductSortField>,
    #[serde(default)]
    pub sort_descending: bool,
}

impl Default for ProductSearchRequest {
    fn default() -> Self {
        Self {
            search_term: None,
            category: None,
            min_price: None,
            max_price: None,
            tags: Vec::new(),
            in_stock: None,
            page: default_page(),
            page_size: default_page_size(),
            sort_by: None,
            sort_descending: false,
        }
    }
}

impl ProductSearchRequest {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductSearchResponse {
    pub products: Vec<ProductDto>,
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl ProductSearchResponse {
    pub fn new(products: Vec<ProductDto>, total_count: u64, page: u64, page_size: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_count.div_ceil(page_size)
        };
        Self {
            products,
            total_count,
            page,
            page_size,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_defaults() {
        let request: ProductSearchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 20);
        assert!(request.tags.is_empty());
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_tags_accept_comma_separated_string() {
        let request: ProductSearchRequest =
            serde_json::from_str(r#"{"tags":"desk, lamp,,oak","page":3,"page_size":10}"#)
                .unwrap();
        assert_eq!(request.tags, vec!["desk", "lamp", "oak"]);
        assert_eq!(request.offset(), 20);
    }

    #[test]
    fn test_sort_field_parses_snake_case() {
        let request: ProductSearchRequest =
            serde_json::from_str(r#"{"sort_by":"stock_quantity","sort_descending":true}"#)
                .unwrap();
        assert_eq!(request.sort_by, Some(ProductSortField::StockQuantity));
    }

    #[test]
    fn test_page_size_bounds() {
        let request = ProductSearchRequest {
            page_size: 101,
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_page_upper_bound() {
        let request = ProductSearchRequest {
            page: u64::MAX,
            ..Default::default()
        };
        assert!(request.validate().unwrap_err().field_errors().contains_key("page"));
        assert_eq!(request.offset(), u64::MAX);

        let last = ProductSearchRequest {
            page: 1_000_000,
            page_size: 100,
            ..Default::default()
        };
        assert!(last.validate().is_ok());
        assert_eq!(last.offset(), 99_999_900);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(ProductSearchResponse::new(vec![], 41, 1, 20).total_pages, 3);
        assert_eq!(ProductSearchResponse::new(vec![], 40, 1, 20).total_pages, 2);
        assert_eq!(ProductSearchResponse::new(vec![], 0, 1, 20).total_pages, 0);
    }

    #[test]
    fn test_list_items_must_survive_storage() {
        let mut request = CreateProductRequest {
            name: "Lamp".into(),
            description: String::new(),
            price: 100,
            stock_quantity: 0,
            category: "Lighting".into(),
            tags: vec!["brass".into(), "desk lamp".into()],
            image_urls: vec!["https://cdn.test/a.png".into()],
        };
        assert!(request.validate().is_ok());

        request.tags = vec!["brass,oak".into()];
        assert!(request.validate().unwrap_err().field_errors().contains_key("tags"));

        request.tags = vec![" brass".into()];
        assert!(request.validate().is_err());

        let update = UpdateProductRequest {
            image_urls: Some(vec![String::new()]),
            ..Default::default()
        };
        assert!(update.validate().unwrap_err().field_errors().contains_key("image_urls"));
    }

    #[test]
    fn test_create_request_rejects_negative_price() {
        let request = CreateProductRequest {
            name: "Lamp".into(),
            description: String::new(),
            price: -1,
            stock_quantity: 0,
            category: "Lighting".into(),
            tags: vec![],
            image_urls: vec![],
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
    }
}
