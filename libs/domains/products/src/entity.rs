use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::Product;

/// Sea-ORM entity for the `products` table
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub price: i64,
    pub stock_quantity: i32,
    pub category: String,
    /// Comma-joined
    #[sea_orm(column_type = "Text")]
    pub tags: String,
    /// Comma-joined
    #[sea_orm(column_type = "Text")]
    pub image_urls: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub created_by: String,
    pub updated_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn join_list(items: &[String]) -> String {
    items.join(",")
}

pub(crate) fn split_list(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<Model> for Product {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            stock_quantity: model.stock_quantity,
            category: model.category,
            tags: split_list(&model.tags),
            image_urls: split_list(&model.image_urls),
            is_active: model.is_active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
            created_by: model.created_by,
            updated_by: model.updated_by,
        }
    }
}

impl From<&Product> for ActiveModel {
    fn from(product: &Product) -> Self {
        ActiveModel {
            id: Set(product.id),
            name: Set(product.name.clone()),
            description: Set(product.description.clone()),
            price: Set(product.price),
            stock_quantity: Set(product.stock_quantity),
            category: Set(product.category.clone()),
            tags: Set(join_list(&product.tags)),
            image_urls: Set(join_list(&product.image_urls)),
            is_active: Set(product.is_active),
            created_at: Set(product.created_at.into()),
            updated_at: Set(product.updated_at.into()),
            created_by: Set(product.created_by.clone()),
            updated_by: Set(product.updated_by.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(split_list(""), Vec::<String>::new());
        assert_eq!(split_list("oak, desk,,"), vec!["oak", "desk"]);
    }

    #[test]
    fn test_model_conversion_keeps_lists() {
        let mut product = crate::models::sample("Desk", "Furniture", 15_000, 2);
        product.tags = vec!["oak".into(), "desk".into()];
        product.image_urls = vec!["https://img.example/desk.png".into()];

        let active: ActiveModel = (&product).into();
        let model = Model {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock_quantity: product.stock_quantity,
            category: product.category.clone(),
            tags: active.tags.clone().unwrap(),
            image_urls: active.image_urls.clone().unwrap(),
            is_active: product.is_active,
            created_at: product.created_at.into(),
            updated_at: product.updated_at.into(),
            created_by: product.created_by.clone(),
            updated_by: product.updated_by.clone(),
        };

        assert_eq!(Product::from(model), product);
    }
}
