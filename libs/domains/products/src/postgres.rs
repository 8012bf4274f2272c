use async_trait::async_trait;
use contracts::products::{ProductSearchRequest, ProductSortField};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{ProductError, ProductResult},
    models::Product,
    repository::ProductRepository,
};

pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn search_condition(criteria: &ProductSearchRequest) -> Condition {
        let mut condition = Condition::all();

        if let Some(term) = criteria
            .search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            // Literal substring match; `%` and `_` in the term are not wildcards.
            condition = condition.add(Expr::cust_with_values(
                "(POSITION($1 IN LOWER(name)) > 0 OR POSITION($1 IN LOWER(description)) > 0)",
                [term.to_lowercase()],
            ));
        }

        if let Some(category) = criteria.category.as_deref().filter(|c| !c.is_empty()) {
            condition = condition.add(entity::Column::Category.eq(category));
        }
        if let Some(min) = criteria.min_price {
            condition = condition.add(entity::Column::Price.gte(min));
        }
        if let Some(max) = criteria.max_price {
            condition = condition.add(entity::Column::Price.lte(max));
        }

        if !criteria.tags.is_empty() {
            let any_tag = criteria.tags.iter().fold(Condition::any(), |any, tag| {
                any.add(Expr::cust_with_values(
                    "$1 = ANY(STRING_TO_ARRAY(tags, ','))",
                    [tag.clone()],
                ))
            });
            condition = condition.add(any_tag);
        }

        match criteria.in_stock {
            Some(true) => {
                condition = condition
                    .add(entity::Column::IsActive.eq(true))
                    .add(entity::Column::StockQuantity.gt(0));
            }
            Some(false) => {
                condition = condition.add(
                    Condition::any()
                        .add(entity::Column::IsActive.eq(false))
                        .add(entity::Column::StockQuantity.lte(0)),
                );
            }
            None => {}
        }

        condition
    }

    fn ordered(
        query: Select<entity::Entity>,
        field: Option<ProductSortField>,
        descending: bool,
    ) -> Select<entity::Entity> {
        let column = match field.unwrap_or(ProductSortField::Name) {
            ProductSortField::Name => entity::Column::Name,
            ProductSortField::Price => entity::Column::Price,
            ProductSortField::CreatedAt => entity::Column::CreatedAt,
            ProductSortField::StockQuantity => entity::Column::StockQuantity,
        };
        let order = if descending { Order::Desc } else { Order::Asc };
        query
            .order_by(column, order.clone())
            .order_by(entity::Column::Id, order)
    }

    async fn fetch(&self, query: Select<entity::Entity>) -> ProductResult<Vec<Product>> {
        let models = Self::ordered(query, None, false).all(&self.db).await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn get_all(&self) -> ProductResult<Vec<Product>> {
        self.fetch(entity::Entity::find()).await
    }

    async fn get_active(&self) -> ProductResult<Vec<Product>> {
        self.fetch(entity::Entity::find().filter(entity::Column::IsActive.eq(true)))
            .await
    }

    async fn search(&self, criteria: &ProductSearchRequest) -> ProductResult<(Vec<Product>, u64)> {
        let query = entity::Entity::find().filter(Self::search_condition(criteria));
        let paginator = Self::ordered(query, criteria.sort_by, criteria.sort_descending)
            .paginate(&self.db, criteria.page_size.max(1));

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(criteria.page.saturating_sub(1)).await?;

        tracing::debug!(total, returned = models.len(), "Product search");
        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn get_by_category(&self, category: &str) -> ProductResult<Vec<Product>> {
        self.fetch(entity::Entity::find().filter(entity::Column::Category.eq(category)))
            .await
    }

    async fn get_categories(&self) -> ProductResult<Vec<String>> {
        let categories = entity::Entity::find()
            .select_only()
            .column(entity::Column::Category)
            .distinct()
            .order_by_asc(entity::Column::Category)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    async fn create(&self, product: Product) -> ProductResult<Product> {
        let active: entity::ActiveModel = (&product).into();
        let model = active.insert(&self.db).await?;

        tracing::info!(product_id = %model.id, "Created product");
        Ok(model.into())
    }

    async fn update(&self, product: Product) -> ProductResult<Product> {
        let active: entity::ActiveModel = (&product).into();
        let model = active.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => {
                ProductError::NotFound(product.id)
            }
            other => ProductError::Database(other),
        })?;

        tracing::info!(product_id = %model.id, "Updated product");
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let result = entity::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected > 0 {
            tracing::info!(product_id = %id, "Deleted product");
        }
        Ok(result.rows_affected > 0)
    }

    async fn exists(&self, id: Uuid) -> ProductResult<bool> {
        let count = entity::Entity::find_by_id(id).count(&self.db).await?;
        Ok(count > 0)
    }
}
