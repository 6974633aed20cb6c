use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, NewProduct, Pagination, Product, ProductPlain, UpdateProduct};
use crate::repository::ProductRepository;

/// Length of a hyphenated UUID, the only id form a lookup term may take
const HYPHENATED_UUID_LEN: usize = 36;

/// Service layer for Product business logic
#[derive(Clone)]
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository
            .create(NewProduct::from(input))
            .await
            .map_err(|err| handle_db_error(err, "creating product"))
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self, page: Pagination) -> ProductResult<Vec<Product>> {
        page.validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository.list(page).await
    }

    /// Resolve `term` as an id when it is a hyphenated UUID, else as a title or slug.
    #[instrument(skip(self))]
    pub async fn find_one(&self, term: &str) -> ProductResult<Product> {
        let found = match parse_id(term) {
            Some(id) => self.repository.find_by_id(id).await?,
            None => self.repository.find_by_term(term).await?,
        };

        found.ok_or_else(|| ProductError::not_found(term))
    }

    pub async fn find_one_plain(&self, term: &str) -> ProductResult<ProductPlain> {
        self.find_one(term).await.map(ProductPlain::from)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<ProductPlain> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        let (changes, images) = input.into_parts();
        self.repository
            .update(id, changes, images)
            .await?
            .ok_or_else(|| ProductError::not_found(id))?;

        self.find_one_plain(&id.to_string()).await
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: Uuid) -> ProductResult<()> {
        let product = self.find_one(&id.to_string()).await?;
        self.repository.delete(product.id).await?;
        Ok(())
    }

    /// Wipe the catalogue; used for reseeding.
    #[instrument(skip(self))]
    pub async fn delete_all_products(&self) -> ProductResult<u64> {
        self.repository
            .delete_all()
            .await
            .map_err(|err| handle_db_error(err, "deleting products"))
    }
}

fn parse_id(term: &str) -> Option<Uuid> {
    if term.len() != HYPHENATED_UUID_LEN {
        return None;
    }
    Uuid::try_parse(term).ok()
}

/// Store failures become opaque; client-facing errors pass through.
fn handle_db_error(err: ProductError, context: &str) -> ProductError {
    match err {
        ProductError::Database(detail) => {
            tracing::error!(error = %detail, "Unexpected error {}", context);
            ProductError::Internal(format!(
                "Unexpected error {}, check the logs for more details",
                context
            ))
        }
        other => other,
    }
}
