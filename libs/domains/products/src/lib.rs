//! Products Domain
//!
//! Catalog management: CRUD, stock levels, search and categories.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, build commands/queries
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Commands   │  ← one `Handler` impl per request type
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← use cases
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← trait; in-memory and PostgreSQL implementations
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Product and its stock rules
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_products::{handlers, PgProductRepository, ProductService};
//!
//! # async fn example(db: sea_orm::DatabaseConnection) {
//! let service = ProductService::new(PgProductRepository::new(db));
//! let auth = JwtAuth::new(JwtConfig::with_issuer("https://idp.example/realms/shop"));
//! let router = handlers::router(service, auth);
//! # }
//! ```

pub mod commands;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use commands::{
    CreateProductCommand, DeleteProductCommand, GetCategoriesQuery, GetProductByIdQuery,
    GetProductsByCategoryQuery, GetProductsQuery, SearchProductsQuery, UpdateProductCommand,
    UpdateStockCommand,
};
pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use models::{Product, SYSTEM_ACTOR};
pub use postgres::PgProductRepository;
pub use repository::{InMemoryProductRepository, ProductRepository};
pub use service::ProductService;
