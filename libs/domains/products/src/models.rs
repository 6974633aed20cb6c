use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Garment size offered for a product
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Size {
    Xs,
    S,
    M,
    L,
    Xl,
    Xxl,
    Xxxl,
}

/// Target audience, stored as the `product_gender` Postgres enum
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "product_gender")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    #[sea_orm(string_value = "men")]
    Men,
    #[sea_orm(string_value = "women")]
    Women,
    #[sea_orm(string_value = "kid")]
    Kid,
    #[sea_orm(string_value = "unisex")]
    Unisex,
}

/// Image owned by a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub id: Uuid,
    pub url: String,
}

/// Product aggregate: the product row plus its images in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    /// Unique across all products
    pub title: String,
    pub price: f64,
    pub description: Option<String>,
    /// Unique, lower-case, URL-safe identifier
    pub slug: String,
    pub stock: i32,
    pub sizes: Vec<Size>,
    pub gender: Gender,
    pub tags: Vec<String>,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product with its images flattened to URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductPlain {
    pub id: Uuid,
    pub title: String,
    pub price: f64,
    pub description: Option<String>,
    pub slug: String,
    pub stock: i32,
    pub sizes: Vec<Size>,
    pub gender: Gender,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductPlain {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            description: product.description,
            slug: product.slug,
            stock: product.stock,
            sizes: product.sizes,
            gender: product.gender,
            tags: product.tags,
            images: product.images.into_iter().map(|image| image.url).collect(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// DTO for creating a product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub description: Option<String>,
    /// Derived from the title when omitted
    #[validate(length(min = 1))]
    pub slug: Option<String>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub sizes: Vec<Size>,
    pub gender: Gender,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Image URLs, kept in this order
    #[serde(default)]
    pub images: Vec<String>,
}

/// DTO for a partial update; `images`, when present, replaces the whole list
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub slug: Option<String>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub sizes: Option<Vec<Size>>,
    pub gender: Option<Gender>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

/// Largest value Postgres accepts for `LIMIT`/`OFFSET` (a signed bigint)
pub const MAX_PAGE_VALUE: u64 = i64::MAX as u64;

/// `?limit=&offset=` query for listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Validate, ToSchema, IntoParams)]
pub struct Pagination {
    /// Page size, defaults to 10
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = MAX_PAGE_VALUE))]
    pub limit: u64,
    /// Rows to skip, defaults to 0
    #[serde(default)]
    #[validate(range(max = MAX_PAGE_VALUE))]
    pub offset: u64,
}

fn default_limit() -> u64 {
    10
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// Fully resolved product handed to the repository on create
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub price: f64,
    pub description: Option<String>,
    pub slug: String,
    pub stock: i32,
    pub sizes: Vec<Size>,
    pub gender: Gender,
    pub tags: Vec<String>,
    pub images: Vec<String>,
}

/// Scalar fields to merge onto an existing product; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub stock: Option<i32>,
    pub sizes: Option<Vec<Size>>,
    pub gender: Option<Gender>,
    pub tags: Option<Vec<String>>,
}

/// Lower-case, with spaces and apostrophes turned into `-`.
pub fn normalize_slug(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '\'' { '-' } else { c })
        .collect()
}

impl From<CreateProduct> for NewProduct {
    fn from(input: CreateProduct) -> Self {
        let slug = normalize_slug(input.slug.as_deref().unwrap_or(&input.title));

        Self {
            title: input.title,
            price: input.price.unwrap_or(0.0),
            description: input.description,
            slug,
            stock: input.stock.unwrap_or(0),
            sizes: input.sizes,
            gender: input.gender,
            tags: input.tags,
            images: input.images,
        }
    }
}

impl UpdateProduct {
    /// Split into scalar changes and the optional replacement image list
    pub fn into_parts(self) -> (ProductChanges, Option<Vec<String>>) {
        let changes = ProductChanges {
            title: self.title,
            price: self.price,
            description: self.description,
            slug: self.slug.as_deref().map(normalize_slug),
            stock: self.stock,
            sizes: self.sizes,
            gender: self.gender,
            tags: self.tags,
        };

        (changes, self.images)
    }
}

impl ProductChanges {
    pub fn apply_to(self, product: &mut Product) {
        if let Some(title) = self.title {
            product.title = title;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(slug) = self.slug {
            product.slug = slug;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(sizes) = self.sizes {
            product.sizes = sizes;
        }
        if let Some(gender) = self.gender {
            product.gender = gender;
        }
        if let Some(tags) = self.tags {
            product.tags = tags;
        }
    }
}
