use chrono::{DateTime, Utc};
use contracts::products::{CreateProductRequest, ProductDto, UpdateProductRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};

/// Recorded as the author when a write has no authenticated caller.
pub const SYSTEM_ACTOR: &str = "system";

/// Catalog product.
///
/// Stock is kept non-negative by the methods below; the struct fields are public for
/// the repositories, so code outside this module should go through them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Cents
    pub price: i64,
    pub stock_quantity: i32,
    pub category: String,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

impl Product {
    pub fn new(input: CreateProductRequest, created_by: Option<&str>) -> Self {
        let actor = created_by
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(SYSTEM_ACTOR)
            .to_string();
        let now = Utc::now();

        Self {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
            price: input.price,
            stock_quantity: input.stock_quantity.max(0),
            category: input.category,
            tags: input.tags,
            image_urls: input.image_urls,
            is_active: true,
            created_at: now,
            updated_at: now,
            created_by: actor.clone(),
            updated_by: actor,
        }
    }

    pub fn is_in_stock(&self) -> bool {
        self.is_active && self.stock_quantity > 0
    }

    /// Sets the absolute stock level.
    pub fn update_stock(&mut self, quantity: i32) -> ProductResult<()> {
        if quantity < 0 {
            return Err(ProductError::InvalidOperation(
                "Stock quantity cannot be negative".to_string(),
            ));
        }
        self.stock_quantity = quantity;
        self.touch();
        Ok(())
    }

    pub fn reserve_stock(&mut self, quantity: i32) -> ProductResult<()> {
        if quantity <= 0 {
            return Err(ProductError::InvalidOperation(
                "Quantity must be positive".to_string(),
            ));
        }
        if quantity > self.stock_quantity {
            return Err(ProductError::InvalidOperation(
                "Insufficient stock".to_string(),
            ));
        }
        self.stock_quantity -= quantity;
        self.touch();
        Ok(())
    }

    pub fn release_stock(&mut self, quantity: i32) -> ProductResult<()> {
        if quantity <= 0 {
            return Err(ProductError::InvalidOperation(
                "Quantity must be positive".to_string(),
            ));
        }
        self.stock_quantity = self
            .stock_quantity
            .checked_add(quantity)
            .ok_or_else(|| ProductError::InvalidOperation("Stock quantity overflow".to_string()))?;
        self.touch();
        Ok(())
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    /// Applies the provided fields. Empty name, description and category are ignored.
    pub fn apply_update(&mut self, input: UpdateProductRequest, updated_by: Option<&str>) -> ProductResult<()> {
        if let Some(name) = input.name.filter(|s| !s.is_empty()) {
            self.name = name;
        }
        if let Some(description) = input.description.filter(|s| !s.is_empty()) {
            self.description = description;
        }
        if let Some(price) = input.price {
            self.price = price;
        }
        if let Some(quantity) = input.stock_quantity {
            self.update_stock(quantity)?;
        }
        if let Some(category) = input.category.filter(|s| !s.is_empty()) {
            self.category = category;
        }
        if let Some(tags) = input.tags {
            self.tags = tags;
        }
        if let Some(image_urls) = input.image_urls {
            self.image_urls = image_urls;
        }
        match input.is_active {
            Some(true) => self.activate(),
            Some(false) => self.deactivate(),
            None => {}
        }

        self.updated_by = updated_by
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(SYSTEM_ACTOR)
            .to_string();
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        let is_in_stock = product.is_in_stock();
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock_quantity: product.stock_quantity,
            category: product.category,
            tags: product.tags,
            image_urls: product.image_urls,
            is_active: product.is_active,
            is_in_stock,
            created_at: product.created_at,
            updated_at: product.updated_at,
            created_by: product.created_by,
            updated_by: product.updated_by,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample(name: &str, category: &str, price: i64, stock: i32) -> Product {
    Product::new(
        CreateProductRequest {
            name: name.to_string(),
            description: format!("{name} description"),
            price,
            stock_quantity: stock,
            category: category.to_string(),
            tags: vec![],
            image_urls: vec![],
        },
        None,
    )
}
