use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ProductError, ProductResult};
use crate::models::{Gender, NewProduct};

/// OpenAPI tag shared by the product endpoints
pub const TAG: &str = "products";

/// Encode a list column; failures surface as store errors.
pub fn to_json<T: Serialize>(column: &str, value: &T) -> ProductResult<Json> {
    serde_json::to_value(value)
        .map_err(|e| ProductError::Database(format!("Cannot encode {} column: {}", column, e)))
}

/// Decode a list column written by [`to_json`]
pub fn from_json<T: serde::de::DeserializeOwned>(column: &str, value: Json) -> ProductResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ProductError::Database(format!("Corrupt {} column: {}", column, e)))
}

// ===== Products Entity =====

pub mod products {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "products")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(column_type = "String(StringLen::N(200))", unique)]
        pub title: String,
        #[sea_orm(column_type = "Double")]
        pub price: f64,
        #[sea_orm(column_type = "Text", nullable)]
        pub description: Option<String>,
        #[sea_orm(unique)]
        pub slug: String,
        pub stock: i32,
        #[sea_orm(column_type = "JsonBinary")]
        pub sizes: Json,
        pub gender: Gender,
        #[sea_orm(column_type = "JsonBinary")]
        pub tags: Json,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::product_images::Entity")]
        Images,
    }

    impl Related<super::product_images::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Images.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        /// Assemble the domain aggregate; `images` must already be in display order.
        pub fn into_product(
            self,
            images: Vec<super::product_images::Model>,
        ) -> ProductResult<crate::models::Product> {
            Ok(crate::models::Product {
                id: self.id,
                title: self.title,
                price: self.price,
                description: self.description,
                slug: self.slug,
                stock: self.stock,
                sizes: from_json("sizes", self.sizes)?,
                gender: self.gender,
                tags: from_json("tags", self.tags)?,
                images: images.into_iter().map(Into::into).collect(),
                created_at: self.created_at.into(),
                updated_at: self.updated_at.into(),
            })
        }
    }

    impl TryFrom<&NewProduct> for ActiveModel {
        type Error = ProductError;

        fn try_from(input: &NewProduct) -> ProductResult<Self> {
            let now = chrono::Utc::now();
            Ok(ActiveModel {
                id: Set(Uuid::now_v7()),
                title: Set(input.title.clone()),
                price: Set(input.price),
                description: Set(input.description.clone()),
                slug: Set(input.slug.clone()),
                stock: Set(input.stock),
                sizes: Set(to_json("sizes", &input.sizes)?),
                gender: Set(input.gender),
                tags: Set(to_json("tags", &input.tags)?),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            })
        }
    }
}

// ===== Product Images Entity =====

pub mod product_images {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "product_images")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub product_id: Uuid,
        #[sea_orm(column_type = "Text")]
        pub url: String,
        pub position: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::products::Entity",
            from = "Column::ProductId",
            to = "super::products::Column::Id",
            on_delete = "Cascade"
        )]
        Product,
    }

    impl Related<super::products::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Product.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for crate::models::ProductImage {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                url: model.url,
            }
        }
    }

    /// Rows for `urls`, positioned in the given order
    pub fn for_urls(product_id: Uuid, urls: &[String]) -> Vec<ActiveModel> {
        urls.iter()
            .enumerate()
            .map(|(position, url)| ActiveModel {
                id: Set(Uuid::now_v7()),
                product_id: Set(product_id),
                url: Set(url.clone()),
                position: Set(position as i32),
            })
            .collect()
    }
}
