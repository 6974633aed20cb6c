use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    entity::{product_images, products, to_json},
    error::ProductResult,
    models::{NewProduct, Pagination, Product, ProductChanges},
    repository::ProductRepository,
};

pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Commit on success, roll back and keep the original error otherwise.
async fn finish<T>(txn: DatabaseTransaction, result: ProductResult<T>) -> ProductResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

/// `UPPER(title) = UPPER(term)`, both sides cased by the database collation
fn title_matches(term: &str) -> Expr {
    use sea_orm::sea_query::ExprTrait;

    Expr::expr(Func::upper(Expr::col((
        products::Entity,
        products::Column::Title,
    ))))
    .eq(Func::upper(Expr::val(term)))
}

/// Images for each product id, in display order
async fn load_images<C: ConnectionTrait>(
    conn: &C,
    product_ids: Vec<Uuid>,
) -> ProductResult<HashMap<Uuid, Vec<product_images::Model>>> {
    let rows = product_images::Entity::find()
        .filter(product_images::Column::ProductId.is_in(product_ids))
        .order_by_asc(product_images::Column::ProductId)
        .order_by_asc(product_images::Column::Position)
        .all(conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<product_images::Model>> = HashMap::new();
    for row in rows {
        grouped.entry(row.product_id).or_default().push(row);
    }
    Ok(grouped)
}

async fn with_images<C: ConnectionTrait>(
    conn: &C,
    model: products::Model,
) -> ProductResult<Product> {
    let images = model
        .find_related(product_images::Entity)
        .order_by_asc(product_images::Column::Position)
        .all(conn)
        .await?;
    model.into_product(images)
}

async fn insert_images<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    urls: &[String],
) -> ProductResult<()> {
    if urls.is_empty() {
        return Ok(());
    }
    product_images::Entity::insert_many(product_images::for_urls(product_id, urls))
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

impl PgProductRepository {
    async fn create_in(&self, txn: &DatabaseTransaction, input: &NewProduct) -> ProductResult<Product> {
        let model = products::ActiveModel::try_from(input)?.insert(txn).await?;
        insert_images(txn, model.id, &input.images).await?;
        with_images(txn, model).await
    }

    async fn update_in(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
        changes: ProductChanges,
        images: Option<Vec<String>>,
    ) -> ProductResult<Option<Product>> {
        let Some(model) = products::Entity::find_by_id(id).one(txn).await? else {
            return Ok(None);
        };

        if let Some(urls) = images {
            product_images::Entity::delete_many()
                .filter(product_images::Column::ProductId.eq(id))
                .exec(txn)
                .await?;
            insert_images(txn, id, &urls).await?;
        }

        let mut active: products::ActiveModel = model.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(slug) = changes.slug {
            active.slug = Set(slug);
        }
        if let Some(stock) = changes.stock {
            active.stock = Set(stock);
        }
        if let Some(sizes) = changes.sizes {
            active.sizes = Set(to_json("sizes", &sizes)?);
        }
        if let Some(gender) = changes.gender {
            active.gender = Set(gender);
        }
        if let Some(tags) = changes.tags {
            active.tags = Set(to_json("tags", &tags)?);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let model = active.update(txn).await?;
        with_images(txn, model).await.map(Some)
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        let txn = self.db.begin().await?;
        let result = self.create_in(&txn, &input).await;
        let product = finish(txn, result).await?;

        tracing::info!(product_id = %product.id, "Created product");
        Ok(product)
    }

    async fn list(&self, page: Pagination) -> ProductResult<Vec<Product>> {
        let models = products::Entity::find()
            .order_by_asc(products::Column::CreatedAt)
            .order_by_asc(products::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.db)
            .await?;

        let mut images = load_images(&self.db, models.iter().map(|m| m.id).collect()).await?;

        models
            .into_iter()
            .map(|model| {
                let rows = images.remove(&model.id).unwrap_or_default();
                model.into_product(rows)
            })
            .collect()
    }

    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        match products::Entity::find_by_id(id).one(&self.db).await? {
            Some(model) => with_images(&self.db, model).await.map(Some),
            None => Ok(None),
        }
    }

    async fn find_by_term(&self, term: &str) -> ProductResult<Option<Product>> {
        let model = products::Entity::find()
            .filter(
                Condition::any()
                    .add(title_matches(term))
                    .add(products::Column::Slug.eq(term.to_lowercase())),
            )
            .order_by_asc(products::Column::CreatedAt)
            .order_by_asc(products::Column::Id)
            .one(&self.db)
            .await?;

        match model {
            Some(model) => with_images(&self.db, model).await.map(Some),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ProductChanges,
        images: Option<Vec<String>>,
    ) -> ProductResult<Option<Product>> {
        let txn = self.db.begin().await?;
        let result = self.update_in(&txn, id, changes, images).await;
        let updated = finish(txn, result).await?;

        if updated.is_some() {
            tracing::info!(product_id = %id, "Updated product");
        }
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let result = products::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(product_id = %id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_all(&self) -> ProductResult<u64> {
        let result = products::Entity::delete_many().exec(&self.db).await?;

        tracing::info!(removed = result.rows_affected, "Deleted all products");
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProductError;
    use crate::models::Gender;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    fn product_row(title: &str) -> products::Model {
        let now = chrono::Utc::now();
        products::Model {
            id: Uuid::now_v7(),
            title: title.to_string(),
            price: 10.0,
            description: None,
            slug: title.to_lowercase(),
            stock: 0,
            sizes: serde_json::json!(["M"]),
            gender: Gender::Men,
            tags: serde_json::json!([]),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn image_row(product_id: Uuid, url: &str, position: i32) -> product_images::Model {
        product_images::Model {
            id: Uuid::now_v7(),
            product_id,
            url: url.to_string(),
            position,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_attaches_images() {
        let row = product_row("Shirt");
        let id = row.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .append_query_results([vec![image_row(id, "a.jpg", 0), image_row(id, "b.jpg", 1)]])
            .into_connection();

        let repo = PgProductRepository::new(db);
        let product = repo.find_by_id(id).await.unwrap().unwrap();

        assert_eq!(
            product.images.iter().map(|i| i.url.as_str()).collect::<Vec<_>>(),
            vec!["a.jpg", "b.jpg"]
        );
    }

    #[tokio::test]
    async fn test_find_by_term_miss() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<products::Model>::new()])
            .into_connection();

        let repo = PgProductRepository::new(db);
        assert!(repo.find_by_term("shirt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_groups_images_per_product() {
        let first = product_row("A");
        let second = product_row("B");
        let (first_id, second_id) = (first.id, second.id);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![first, second]])
            .append_query_results([vec![
                image_row(first_id, "a.jpg", 0),
                image_row(second_id, "b.jpg", 0),
                image_row(second_id, "c.jpg", 1),
            ]])
            .into_connection();

        let repo = PgProductRepository::new(db);
        let products = repo.list(Pagination::default()).await.unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].images.len(), 1);
        assert_eq!(products[1].images[1].url, "c.jpg");
    }

    #[tokio::test]
    async fn test_list_surfaces_corrupt_json_columns() {
        let mut row = product_row("Shirt");
        row.tags = serde_json::json!("sale");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .append_query_results([Vec::<product_images::Model>::new()])
            .into_connection();

        let repo = PgProductRepository::new(db);
        let err = repo.list(Pagination::default()).await.unwrap_err();
        assert!(matches!(&err, ProductError::Database(msg) if msg.contains("tags")));
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_database_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();

        let repo = PgProductRepository::new(db);
        let err = repo.find_by_id(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, ProductError::Database(_)));
    }
}
