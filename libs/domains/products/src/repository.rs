use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{NewProduct, Pagination, Product, ProductChanges, ProductImage};

/// Repository trait for Product persistence
///
/// Every write is atomic: a product and its images are stored or changed together.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product with its images
    async fn create(&self, input: NewProduct) -> ProductResult<Product>;

    /// Page through products, oldest first
    async fn list(&self, page: Pagination) -> ProductResult<Vec<Product>>;

    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Match on upper-cased title or lower-cased slug
    async fn find_by_term(&self, term: &str) -> ProductResult<Option<Product>>;

    /// Merge `changes`; `images`, when present, replaces the stored list.
    /// Returns `None` when no product has this id.
    async fn update(
        &self,
        id: Uuid,
        changes: ProductChanges,
        images: Option<Vec<String>>,
    ) -> ProductResult<Option<Product>>;

    /// Delete a product and its images
    async fn delete(&self, id: Uuid) -> ProductResult<bool>;

    /// Delete every product, returning how many were removed
    async fn delete_all(&self) -> ProductResult<u64>;
}

/// In-memory implementation of ProductRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn images_for(urls: Vec<String>) -> Vec<ProductImage> {
    urls.into_iter()
        .map(|url| ProductImage {
            id: Uuid::now_v7(),
            url,
        })
        .collect()
}

/// Unique title and slug, mirroring the table constraints
fn check_unique<'a>(
    mut others: impl Iterator<Item = &'a Product>,
    title: &str,
    slug: &str,
) -> ProductResult<()> {
    others.try_for_each(|p| {
        if p.title == title {
            Err(ProductError::Conflict(format!(
                "Key (title)=({}) already exists.",
                title
            )))
        } else if p.slug == slug {
            Err(ProductError::Conflict(format!(
                "Key (slug)=({}) already exists.",
                slug
            )))
        } else {
            Ok(())
        }
    })
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        let mut products = self.products.write().await;
        check_unique(products.values(), &input.title, &input.slug)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::now_v7(),
            title: input.title,
            price: input.price,
            description: input.description,
            slug: input.slug,
            stock: input.stock,
            sizes: input.sizes,
            gender: input.gender,
            tags: input.tags,
            images: images_for(input.images),
            created_at: now,
            updated_at: now,
        };
        products.insert(product.id, product.clone());

        tracing::info!(product_id = %product.id, "Created product");
        Ok(product)
    }

    async fn list(&self, page: Pagination) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;

        let mut result: Vec<Product> = products.values().cloned().collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(result
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(&id).cloned())
    }

    async fn find_by_term(&self, term: &str) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        let title = term.to_uppercase();
        let slug = term.to_lowercase();

        Ok(products
            .values()
            .filter(|p| p.title.to_uppercase() == title || p.slug == slug)
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ProductChanges,
        images: Option<Vec<String>>,
    ) -> ProductResult<Option<Product>> {
        let mut products = self.products.write().await;

        let Some(mut updated) = products.get(&id).cloned() else {
            return Ok(None);
        };
        changes.apply_to(&mut updated);
        check_unique(
            products.values().filter(|p| p.id != id),
            &updated.title,
            &updated.slug,
        )?;

        if let Some(urls) = images {
            updated.images = images_for(urls);
        }
        updated.updated_at = Utc::now();
        products.insert(id, updated.clone());

        tracing::info!(product_id = %id, "Updated product");
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let mut products = self.products.write().await;

        if products.remove(&id).is_some() {
            tracing::info!(product_id = %id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_all(&self) -> ProductResult<u64> {
        let mut products = self.products.write().await;
        let removed = products.len() as u64;
        products.clear();

        tracing::info!(removed, "Deleted all products");
        Ok(removed)
    }
}
