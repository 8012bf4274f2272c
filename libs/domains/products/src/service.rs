//! Product Service - one method per catalog use case

use std::sync::Arc;

use contracts::products::{
    CreateProductRequest, ProductDto, ProductSearchRequest, ProductSearchResponse,
    UpdateProductRequest,
};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::Product;
use crate::repository::ProductRepository;

pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    async fn load(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> ProductResult<ProductDto> {
        self.load(id).await.map(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_all_products(&self) -> ProductResult<Vec<ProductDto>> {
        let products = self.repository.get_all().await?;
        Ok(products.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_active_products(&self) -> ProductResult<Vec<ProductDto>> {
        let products = self.repository.get_active().await?;
        Ok(products.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, criteria), fields(page = criteria.page, page_size = criteria.page_size))]
    pub async fn search_products(
        &self,
        criteria: ProductSearchRequest,
    ) -> ProductResult<ProductSearchResponse> {
        criteria.validate()?;

        let (products, total) = self.repository.search(&criteria).await?;
        Ok(ProductSearchResponse::new(
            products.into_iter().map(Into::into).collect(),
            total,
            criteria.page,
            criteria.page_size,
        ))
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductRequest,
        created_by: Option<String>,
    ) -> ProductResult<ProductDto> {
        input.validate()?;

        let product = Product::new(input, created_by.as_deref());
        let created = self.repository.create(product).await?;
        Ok(created.into())
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductRequest,
        updated_by: Option<String>,
    ) -> ProductResult<ProductDto> {
        input.validate()?;

        let mut product = self.load(id).await?;
        product.apply_update(input, updated_by.as_deref())?;
        let updated = self.repository.update(product).await?;
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> ProductResult<()> {
        if !self.repository.exists(id).await? {
            return Err(ProductError::NotFound(id));
        }
        self.repository.delete(id).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> ProductResult<Vec<String>> {
        self.repository.get_categories().await
    }

    #[instrument(skip(self))]
    pub async fn get_products_by_category(&self, category: &str) -> ProductResult<Vec<ProductDto>> {
        let products = self.repository.get_by_category(category).await?;
        Ok(products.into_iter().map(Into::into).collect())
    }

    /// Sets the absolute stock level.
    #[instrument(skip(self))]
    pub async fn update_stock(&self, id: Uuid, quantity: i32) -> ProductResult<ProductDto> {
        let mut product = self.load(id).await?;
        product.update_stock(quantity)?;
        let updated = self.repository.update(product).await?;
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn reserve_stock(&self, id: Uuid, quantity: i32) -> ProductResult<ProductDto> {
        let mut product = self.load(id).await?;
        product.reserve_stock(quantity)?;
        let updated = self.repository.update(product).await?;
        tracing::info!(product_id = %id, quantity, remaining = updated.stock_quantity, "Reserved stock");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn release_stock(&self, id: Uuid, quantity: i32) -> ProductResult<ProductDto> {
        let mut product = self.load(id).await?;
        product.release_stock(quantity)?;
        let updated = self.repository.update(product).await?;
        Ok(updated.into())
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SYSTEM_ACTOR, sample};
    use crate::repository::MockProductRepository;
    use mockall::predicate::eq;

    fn create_request() -> CreateProductRequest {
        CreateProductRequest {
            name: "Lamp".into(),
            description: "Brass desk lamp".into(),
            price: 4_999,
            stock_quantity: 10,
            category: "Lighting".into(),
            tags: vec!["brass".into()],
            image_urls: vec![],
        }
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let id = Uuid::now_v7();
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(None));

        let service = ProductService::new(repo);
        let err = service.get_product(id).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Product with ID {id} not found"));
    }

    #[tokio::test]
    async fn test_create_product_records_caller() {
        let mut repo = MockProductRepository::new();
        repo.expect_create()
            .withf(|p| p.created_by == "kc-1" && p.updated_by == "kc-1" && p.is_active)
            .times(1)
            .returning(Ok);

        let service = ProductService::new(repo);
        let dto = service
            .create_product(create_request(), Some("kc-1".into()))
            .await
            .unwrap();
        assert_eq!(dto.created_by, "kc-1");
        assert!(dto.is_in_stock);
    }

    #[tokio::test]
    async fn test_create_product_without_caller_uses_system() {
        let mut repo = MockProductRepository::new();
        repo.expect_create().returning(Ok);

        let service = ProductService::new(repo);
        let dto = service.create_product(create_request(), None).await.unwrap();
        assert_eq!(dto.created_by, SYSTEM_ACTOR);
    }

    #[tokio::test]
    async fn test_create_product_rejects_invalid_input() {
        let repo = MockProductRepository::new();
        let service = ProductService::new(repo);

        let mut request = create_request();
        request.name = String::new();
        let result = service.create_product(request, None).await;
        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_stock_rejects_negative_without_writing() {
        let product = sample("Lamp", "Lighting", 1_999, 5);
        let id = product.id;
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(product.clone())));
        repo.expect_update().never();

        let service = ProductService::new(repo);
        let err = service.update_stock(id, -3).await.unwrap_err();
        assert_eq!(err.to_string(), "Stock quantity cannot be negative");
    }

    #[tokio::test]
    async fn test_reserve_stock_insufficient() {
        let product = sample("Lamp", "Lighting", 1_999, 2);
        let id = product.id;
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(product.clone())));
        repo.expect_update().never();

        let service = ProductService::new(repo);
        let err = service.reserve_stock(id, 3).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock");
    }

    #[tokio::test]
    async fn test_delete_checks_existence_first() {
        let id = Uuid::now_v7();
        let mut repo = MockProductRepository::new();
        repo.expect_exists().with(eq(id)).returning(|_| Ok(false));
        repo.expect_delete().never();

        let service = ProductService::new(repo);
        assert!(matches!(
            service.delete_product(id).await,
            Err(ProductError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_computes_total_pages() {
        let mut repo = MockProductRepository::new();
        repo.expect_search().returning(|criteria| {
            assert_eq!(criteria.page, 2);
            Ok((vec![sample("Lamp", "Lighting", 1_999, 1)], 45))
        });

        let service = ProductService::new(repo);
        let response = service
            .search_products(ProductSearchRequest {
                page: 2,
                page_size: 20,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(response.total_count, 45);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.products.len(), 1);
    }

    #[tokio::test]
    async fn test_update_product_is_partial() {
        let product = sample("Lamp", "Lighting", 1_999, 5);
        let id = product.id;
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(product.clone())));
        repo.expect_update().returning(Ok);

        let service = ProductService::new(repo);
        let dto = service
            .update_product(
                id,
                UpdateProductRequest {
                    price: Some(2_499),
                    description: Some(String::new()),
                    ..Default::default()
                },
                Some("kc-2".into()),
            )
            .await
            .unwrap();

        assert_eq!(dto.price, 2_499);
        assert_eq!(dto.name, "Lamp");
        assert_eq!(dto.description, "Lamp description");
        assert_eq!(dto.updated_by, "kc-2");
    }
}
