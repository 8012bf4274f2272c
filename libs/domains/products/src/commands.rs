//! Commands and queries served by [`ProductService`].

use async_trait::async_trait;
use contracts::products::{
    CreateProductRequest, ProductDto, ProductSearchRequest, ProductSearchResponse,
    UpdateProductRequest,
};
use contracts::{Handler, Request};
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::repository::ProductRepository;
use crate::service::ProductService;

#[derive(Debug, Clone)]
pub struct GetProductsQuery {
    pub active_only: bool,
}

#[derive(Debug, Clone)]
pub struct GetProductByIdQuery {
    pub id: Uuid,
}

#[derive(Debug, Clone)]
pub struct SearchProductsQuery {
    pub criteria: ProductSearchRequest,
}

#[derive(Debug, Clone)]
pub struct GetCategoriesQuery;

#[derive(Debug, Clone)]
pub struct GetProductsByCategoryQuery {
    pub category: String,
}

#[derive(Debug, Clone)]
pub struct CreateProductCommand {
    pub request: CreateProductRequest,
    /// Subject of the caller
    pub created_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateProductCommand {
    pub id: Uuid,
    pub request: UpdateProductRequest,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeleteProductCommand {
    pub id: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdateStockCommand {
    pub id: Uuid,
    pub quantity: i32,
}

impl Request for GetProductsQuery {
    type Response = Vec<ProductDto>;
}

impl Request for GetProductByIdQuery {
    type Response = ProductDto;
}

impl Request for SearchProductsQuery {
    type Response = ProductSearchResponse;
}

impl Request for GetCategoriesQuery {
    type Response = Vec<String>;
}

impl Request for GetProductsByCategoryQuery {
    type Response = Vec<ProductDto>;
}

impl Request for CreateProductCommand {
    type Response = ProductDto;
}

impl Request for UpdateProductCommand {
    type Response = ProductDto;
}

impl Request for DeleteProductCommand {
    type Response = ();
}

impl Request for UpdateStockCommand {
    type Response = ProductDto;
}

#[async_trait]
impl<R: ProductRepository> Handler<GetProductsQuery> for ProductService<R> {
    type Error = ProductError;

    async fn handle(&self, query: GetProductsQuery) -> ProductResult<Vec<ProductDto>> {
        if query.active_only {
            self.get_active_products().await
        } else {
            self.get_all_products().await
        }
    }
}

#[async_trait]
impl<R: ProductRepository> Handler<GetProductByIdQuery> for ProductService<R> {
    type Error = ProductError;

    async fn handle(&self, query: GetProductByIdQuery) -> ProductResult<ProductDto> {
        self.get_product(query.id).await
    }
}

#[async_trait]
impl<R: ProductRepository> Handler<SearchProductsQuery> for ProductService<R> {
    type Error = ProductError;

    async fn handle(&self, query: SearchProductsQuery) -> ProductResult<ProductSearchResponse> {
        self.search_products(query.criteria).await
    }
}

#[async_trait]
impl<R: ProductRepository> Handler<GetCategoriesQuery> for ProductService<R> {
    type Error = ProductError;

    async fn handle(&self, _query: GetCategoriesQuery) -> ProductResult<Vec<String>> {
        self.get_categories().await
    }
}

#[async_trait]
impl<R: ProductRepository> Handler<GetProductsByCategoryQuery> for ProductService<R> {
    type Error = ProductError;

    async fn handle(&self, query: GetProductsByCategoryQuery) -> ProductResult<Vec<ProductDto>> {
        self.get_products_by_category(&query.category).await
    }
}

#[async_trait]
impl<R: ProductRepository> Handler<CreateProductCommand> for ProductService<R> {
    type Error = ProductError;

    async fn handle(&self, command: CreateProductCommand) -> ProductResult<ProductDto> {
        self.create_product(command.request, command.created_by).await
    }
}

#[async_trait]
impl<R: ProductRepository> Handler<UpdateProductCommand> for ProductService<R> {
    type Error = ProductError;

    async fn handle(&self, command: UpdateProductCommand) -> ProductResult<ProductDto> {
        self.update_product(command.id, command.request, command.updated_by)
            .await
    }
}

#[async_trait]
impl<R: ProductRepository> Handler<DeleteProductCommand> for ProductService<R> {
    type Error = ProductError;

    async fn handle(&self, command: DeleteProductCommand) -> ProductResult<()> {
        self.delete_product(command.id).await
    }
}

#[async_trait]
impl<R: ProductRepository> Handler<UpdateStockCommand> for ProductService<R> {
    type Error = ProductError;

    async fn handle(&self, command: UpdateStockCommand) -> ProductResult<ProductDto> {
        self.update_stock(command.id, command.quantity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryProductRepository;

    fn request(name: &str) -> CreateProductRequest {
        CreateProductRequest {
            name: name.to_string(),
            description: String::new(),
            price: 1_000,
            stock_quantity: 1,
            category: "General".into(),
            tags: vec![],
            image_urls: vec![],
        }
    }

    #[tokio::test]
    async fn test_active_only_query_returns_only_active() {
        let service = ProductService::new(InMemoryProductRepository::new());
        let kept = service
            .handle(CreateProductCommand {
                request: request("Kept"),
                created_by: None,
            })
            .await
            .unwrap();
        let hidden = service
            .handle(CreateProductCommand {
                request: request("Hidden"),
                created_by: None,
            })
            .await
            .unwrap();
        service
            .handle(UpdateProductCommand {
                id: hidden.id,
                request: UpdateProductRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
                updated_by: None,
            })
            .await
            .unwrap();

        let active = service
            .handle(GetProductsQuery { active_only: true })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, kept.id);

        let all = service
            .handle(GetProductsQuery { active_only: false })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_created_product_reads_back_identically() {
        let service = ProductService::new(InMemoryProductRepository::new());
        let mut create = request("Desk");
        create.tags = vec!["oak".into(), "office".into()];
        create.image_urls = vec!["https://img.example/desk.png".into()];

        let created = service
            .handle(CreateProductCommand {
                request: create,
                created_by: Some("kc-3".into()),
            })
            .await
            .unwrap();
        let fetched = service
            .handle(GetProductByIdQuery { id: created.id })
            .await
            .unwrap();

        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_stock_and_delete_commands() {
        let service = ProductService::new(InMemoryProductRepository::new());
        let created = service
            .handle(CreateProductCommand {
                request: request("Chair"),
                created_by: None,
            })
            .await
            .unwrap();

        let updated = service
            .handle(UpdateStockCommand {
                id: created.id,
                quantity: 0,
            })
            .await
            .unwrap();
        assert!(!updated.is_in_stock);

        assert!(
            service
                .handle(UpdateStockCommand {
                    id: created.id,
                    quantity: -1
                })
                .await
                .is_err()
        );

        service
            .handle(DeleteProductCommand { id: created.id })
            .await
            .unwrap();
        assert!(matches!(
            service.handle(GetProductByIdQuery { id: created.id }).await,
            Err(ProductError::NotFound(_))
        ));
        assert_eq!(
            service.handle(GetCategoriesQuery).await.unwrap(),
            Vec::<String>::new()
        );
    }
}
