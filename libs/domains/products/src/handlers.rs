//! HTTP handlers for the Products API

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_helpers::{
    CurrentUser, JwtAuth, UuidPath, ValidatedJson, jwt_auth_middleware,
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use contracts::Handler;
use contracts::products::{
    CreateProductRequest, ProductDto, ProductSearchRequest, ProductSearchResponse,
    ProductSortField, UpdateProductRequest, UpdateStockRequest,
};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

use crate::commands::{
    CreateProductCommand, DeleteProductCommand, GetCategoriesQuery, GetProductByIdQuery,
    GetProductsByCategoryQuery, GetProductsQuery, SearchProductsQuery, UpdateProductCommand,
    UpdateStockCommand,
};
use crate::error::ProductResult;
use crate::repository::ProductRepository;
use crate::service::ProductService;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        get_product,
        create_product,
        update_product,
        delete_product,
        update_stock,
        search_products,
        get_categories,
        get_by_category,
    ),
    components(
        schemas(
            ProductDto, CreateProductRequest, UpdateProductRequest, UpdateStockRequest,
            ProductSearchRequest, ProductSearchResponse, ProductSortField
        ),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Catalog endpoints")
    )
)]
pub struct ApiDoc;

type SharedService<R> = State<Arc<ProductService<R>>>;

/// Reads are public; writes require a bearer token.
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>, auth: JwtAuth) -> Router {
    let shared_service = Arc::new(service);

    let public = Router::new()
        .route("/", get(list_products::<R>))
        .route("/search", get(search_products::<R>))
        .route("/categories", get(get_categories::<R>))
        .route("/category/{category}", get(get_by_category::<R>))
        .route("/{id}", get(get_product::<R>))
        .with_state(shared_service.clone());

    let protected = Router::new()
        .route("/", post(create_product::<R>))
        .route("/{id}", put(update_product::<R>).delete(delete_product::<R>))
        .route("/{id}/stock", put(update_stock::<R>))
        .route_layer(middleware::from_fn_with_state(auth, jwt_auth_middleware))
        .with_state(shared_service);

    public.merge(protected)
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Only active products (default true)
    pub active_only: Option<bool>,
}

/// List products
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(ListQuery),
    responses(
        (status = 200, description = "Products", body = Vec<ProductDto>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): SharedService<R>,
    Query(query): Query<ListQuery>,
) -> ProductResult<Json<Vec<ProductDto>>> {
    let products = service
        .handle(GetProductsQuery {
            active_only: query.active_only.unwrap_or(true),
        })
        .await?;
    Ok(Json(products))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductDto),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): SharedService<R>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<ProductDto>> {
    let product = service.handle(GetProductByIdQuery { id }).await?;
    Ok(Json(product))
}

/// Create a product
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductDto),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateProductRequest>,
) -> ProductResult<impl IntoResponse> {
    let product = service
        .handle(CreateProductCommand {
            request,
            created_by: Some(user.id().to_string()),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product; absent fields are left unchanged
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductDto),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
    ValidatedJson(request): ValidatedJson<UpdateProductRequest>,
) -> ProductResult<Json<ProductDto>> {
    let product = service
        .handle(UpdateProductCommand {
            id,
            request,
            updated_by: Some(user.id().to_string()),
        })
        .await?;
    Ok(Json(product))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): SharedService<R>,
    _user: CurrentUser,
    UuidPath(id): UuidPath,
) -> ProductResult<impl IntoResponse> {
    service.handle(DeleteProductCommand { id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set the stock level of a product
#[utoipa::path(
    put,
    path = "/{id}/stock",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateStockRequest,
    responses(
        (status = 200, description = "Stock updated", body = ProductDto),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_stock<R: ProductRepository>(
    State(service): SharedService<R>,
    _user: CurrentUser,
    UuidPath(id): UuidPath,
    ValidatedJson(request): ValidatedJson<UpdateStockRequest>,
) -> ProductResult<Json<ProductDto>> {
    let product = service
        .handle(UpdateStockCommand {
            id,
            quantity: request.quantity,
        })
        .await?;
    Ok(Json(product))
}

/// Search the catalog
#[utoipa::path(
    get,
    path = "/search",
    tag = "Products",
    params(ProductSearchRequest),
    responses(
        (status = 200, description = "One page of matches", body = ProductSearchResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_products<R: ProductRepository>(
    State(service): SharedService<R>,
    Query(criteria): Query<ProductSearchRequest>,
) -> ProductResult<Json<ProductSearchResponse>> {
    let response = service.handle(SearchProductsQuery { criteria }).await?;
    Ok(Json(response))
}

/// List distinct categories
#[utoipa::path(
    get,
    path = "/categories",
    tag = "Products",
    responses(
        (status = 200, description = "Sorted category names", body = Vec<String>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_categories<R: ProductRepository>(
    State(service): SharedService<R>,
) -> ProductResult<Json<Vec<String>>> {
    let categories = service.handle(GetCategoriesQuery).await?;
    Ok(Json(categories))
}

/// List products in a category
#[utoipa::path(
    get,
    path = "/category/{category}",
    tag = "Products",
    params(
        ("category" = String, Path, description = "Category name")
    ),
    responses(
        (status = 200, description = "Products in category", body = Vec<ProductDto>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_by_category<R: ProductRepository>(
    State(service): SharedService<R>,
    Path(category): Path<String>,
) -> ProductResult<Json<Vec<ProductDto>>> {
    let products = service
        .handle(GetProductsByCategoryQuery { category })
        .await?;
    Ok(Json(products))
}
