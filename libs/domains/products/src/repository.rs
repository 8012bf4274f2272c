use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use contracts::products::{ProductSearchRequest, ProductSortField};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::Product;

/// Data access for products.
///
/// Implementations: [`InMemoryProductRepository`] and
/// [`PgProductRepository`](crate::postgres::PgProductRepository).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    async fn get_all(&self) -> ProductResult<Vec<Product>>;

    async fn get_active(&self) -> ProductResult<Vec<Product>>;

    /// One page of matches plus the number of all matching rows.
    async fn search(&self, criteria: &ProductSearchRequest) -> ProductResult<(Vec<Product>, u64)>;

    async fn get_by_category(&self, category: &str) -> ProductResult<Vec<Product>>;

    /// Distinct categories, sorted
    async fn get_categories(&self) -> ProductResult<Vec<String>>;

    async fn create(&self, product: Product) -> ProductResult<Product>;

    async fn update(&self, product: Product) -> ProductResult<Product>;

    async fn delete(&self, id: Uuid) -> ProductResult<bool>;

    async fn exists(&self, id: Uuid) -> ProductResult<bool>;
}

/// Process-local store for tests and running without a database.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn matches(product: &Product, criteria: &ProductSearchRequest) -> bool {
    if let Some(term) = criteria.search_term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let term = term.to_lowercase();
        if !product.name.to_lowercase().contains(&term)
            && !product.description.to_lowercase().contains(&term)
        {
            return false;
        }
    }
    if let Some(category) = criteria.category.as_deref().filter(|c| !c.is_empty()) {
        if product.category != category {
            return false;
        }
    }
    if criteria.min_price.is_some_and(|min| product.price < min) {
        return false;
    }
    if criteria.max_price.is_some_and(|max| product.price > max) {
        return false;
    }
    if !criteria.tags.is_empty() && !criteria.tags.iter().any(|t| product.tags.contains(t)) {
        return false;
    }
    if let Some(in_stock) = criteria.in_stock {
        if product.is_in_stock() != in_stock {
            return false;
        }
    }
    true
}

pub(crate) fn sort(products: &mut [Product], field: Option<ProductSortField>, descending: bool) {
    products.sort_by(|a, b| {
        let ordering = match field.unwrap_or(ProductSortField::Name) {
            ProductSortField::Name => a.name.cmp(&b.name),
            ProductSortField::Price => a.price.cmp(&b.price),
            ProductSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            ProductSortField::StockQuantity => a.stock_quantity.cmp(&b.stock_quantity),
        }
        .then_with(|| a.id.cmp(&b.id));
        if descending { ordering.reverse() } else { ordering }
    });
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn get_all(&self) -> ProductResult<Vec<Product>> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        sort(&mut products, None, false);
        Ok(products)
    }

    async fn get_active(&self) -> ProductResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .await
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        sort(&mut products, None, false);
        Ok(products)
    }

    async fn search(&self, criteria: &ProductSearchRequest) -> ProductResult<(Vec<Product>, u64)> {
        let mut found: Vec<Product> = self
            .products
            .read()
            .await
            .values()
            .filter(|p| matches(p, criteria))
            .cloned()
            .collect();
        sort(&mut found, criteria.sort_by, criteria.sort_descending);

        let total = found.len() as u64;
        let page = found
            .into_iter()
            .skip(criteria.offset() as usize)
            .take(criteria.page_size as usize)
            .collect();
        Ok((page, total))
    }

    async fn get_by_category(&self, category: &str) -> ProductResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .await
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        sort(&mut products, None, false);
        Ok(products)
    }

    async fn get_categories(&self) -> ProductResult<Vec<String>> {
        let mut categories: Vec<String> = self
            .products
            .read()
            .await
            .values()
            .map(|p| p.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn create(&self, product: Product) -> ProductResult<Product> {
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(&self, product: Product) -> ProductResult<Product> {
        let mut products = self.products.write().await;
        match products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(product)
            }
            None => Err(crate::error::ProductError::NotFound(product.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        Ok(self.products.write().await.remove(&id).is_some())
    }

    async fn exists(&self, id: Uuid) -> ProductResult<bool> {
        Ok(self.products.read().await.contains_key(&id))
    }
}
