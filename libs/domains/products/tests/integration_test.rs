//! Integration tests for Products domain
//!
//! These tests use real PostgreSQL via testcontainers to ensure:
//! - Unique constraints surface as conflicts with the store detail
//! - Image writes are atomic with the product row
//! - Cascades remove owned images
//! - Lookup by id, title and slug follow the lookup rules

use domain_products::models::ProductChanges;
use domain_products::*;
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};

fn create_input(builder: &TestDataBuilder, suffix: &str, images: Vec<String>) -> CreateProduct {
    CreateProduct {
        title: builder.title(suffix),
        price: Some(25.5),
        description: Some("Integration test product".to_string()),
        slug: None,
        stock: Some(3),
        sizes: vec![Size::S, Size::M],
        gender: Gender::Unisex,
        tags: vec!["test".to_string()],
        images,
    }
}

fn urls(product: &Product) -> Vec<&str> {
    product.images.iter().map(|i| i.url.as_str()).collect()
}

// ============================================================================
// Repository Tests
// ============================================================================

#[tokio::test]
async fn test_create_and_find_keeps_image_order() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("create_and_find");

    let images = (0..3).map(|n| builder.image_url(n)).collect::<Vec<_>>();
    let created = repo
        .create(create_input(&builder, "main", images.clone()).into())
        .await
        .unwrap();

    assert_eq!(created.slug, builder.slug("main"));
    assert_eq!(urls(&created), images);

    let fetched = assert_some(
        repo.find_by_id(created.id).await.unwrap(),
        "created product",
    );
    assert_uuid_eq(fetched.id, created.id, "find_by_id");
    assert_eq!(urls(&fetched), images);
    assert_eq!(fetched.sizes, vec![Size::S, Size::M]);
    assert_eq!(fetched.gender, Gender::Unisex);
}

#[tokio::test]
async fn test_duplicate_title_is_conflict_with_detail() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("duplicate_title");

    repo.create(create_input(&builder, "main", vec![]).into())
        .await
        .unwrap();

    let mut duplicate = create_input(&builder, "main", vec![builder.image_url(0)]);
    duplicate.slug = Some("another-slug".to_string());
    let err = repo.create(duplicate.into()).await.unwrap_err();

    match err {
        ProductError::Conflict(detail) => {
            assert!(detail.contains("(title)"), "unexpected detail: {}", detail);
            assert!(detail.contains("already exists"));
        }
        other => panic!("expected conflict, got {:?}", other),
    }

    // The failed insert leaves no orphaned images behind
    assert_eq!(db.count_rows("product_images").await, 0);
}

#[tokio::test]
async fn test_duplicate_derived_slug_is_conflict_with_detail() {
    let db = TestDatabase::new().await;
    let service = ProductService::new(PgProductRepository::new(db.connection()));

    let shirt = |title: &str, images: Vec<String>| CreateProduct {
        title: title.to_string(),
        price: None,
        description: None,
        slug: None,
        stock: None,
        sizes: vec![Size::M],
        gender: Gender::Men,
        tags: vec![],
        images,
    };

    service.create(shirt("Shirt", vec![])).await.unwrap();
    let err = service
        .create(shirt("shirt", vec!["a.jpg".to_string()]))
        .await
        .unwrap_err();

    match err {
        ProductError::Conflict(detail) => {
            assert!(detail.contains("(slug)=(shirt)"), "unexpected detail: {}", detail);
            assert!(detail.contains("already exists"));
        }
        other => panic!("expected conflict, got {:?}", other),
    }

    assert_eq!(db.count_rows("products").await, 1);
    assert_eq!(db.count_rows("product_images").await, 0);
}

#[tokio::test]
async fn test_find_by_term_title_is_case_insensitive() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("term_lookup");

    let created = repo
        .create(create_input(&builder, "Main", vec![]).into())
        .await
        .unwrap();

    let by_title = repo
        .find_by_term(&builder.title("Main").to_lowercase())
        .await
        .unwrap();
    assert_eq!(by_title.map(|p| p.id), Some(created.id));

    let by_slug = repo
        .find_by_term(&builder.slug("main").to_uppercase())
        .await
        .unwrap();
    assert_eq!(by_slug.map(|p| p.id), Some(created.id));

    assert!(repo.find_by_term("no-such-product").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_by_term_matches_non_ascii_title_in_any_case() {
    let db = TestDatabase::new().await;
    let service = ProductService::new(PgProductRepository::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("non_ascii_term");

    let created = service
        .create(CreateProduct {
            title: "Café Shirt".to_string(),
            slug: Some("cafe-shirt".to_string()),
            ..create_input(&builder, "unused", vec![])
        })
        .await
        .unwrap();

    for term in ["Café Shirt", "café shirt", "CAFÉ SHIRT", "cAfÉ sHiRt"] {
        let found = service.find_one(term).await;
        assert_eq!(found.map(|p| p.id).ok(), Some(created.id), "term {}", term);
    }
    assert!(matches!(
        service.find_one("cafe shirt").await,
        Err(ProductError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_orders_by_creation_and_pages() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("list_order");

    let mut ids = Vec::new();
    for suffix in ["a", "b", "c"] {
        let product = repo
            .create(create_input(&builder, suffix, vec![builder.image_url(0)]).into())
            .await
            .unwrap();
        ids.push(product.id);
    }

    let page = repo
        .list(Pagination {
            limit: 2,
            offset: 1,
        })
        .await
        .unwrap();

    assert_eq!(page.iter().map(|p| p.id).collect::<Vec<_>>(), ids[1..]);
    assert!(page.iter().all(|p| p.images.len() == 1));
}

#[tokio::test]
async fn test_update_scalars_keeps_images() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("update_scalars");

    let created = repo
        .create(create_input(&builder, "main", vec![builder.image_url(0)]).into())
        .await
        .unwrap();

    let changes = ProductChanges {
        price: Some(99.0),
        tags: Some(vec!["sale".to_string()]),
        ..Default::default()
    };
    let updated = assert_some(
        repo.update(created.id, changes, None).await.unwrap(),
        "updated product",
    );

    assert_eq!(updated.price, 99.0);
    assert_eq!(updated.tags, vec!["sale"]);
    assert_eq!(updated.images, created.images);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_failed_update_leaves_product_and_images_untouched() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("update_rollback");

    repo.create(create_input(&builder, "taken", vec![]).into())
        .await
        .unwrap();
    let target = repo
        .create(create_input(&builder, "target", vec![builder.image_url(0)]).into())
        .await
        .unwrap();

    let changes = ProductChanges {
        title: Some(builder.title("taken")),
        ..Default::default()
    };
    let err = repo
        .update(target.id, changes, Some(vec![builder.image_url(9)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ProductError::Conflict(_)));

    let stored = assert_some(
        repo.find_by_id(target.id).await.unwrap(),
        "target product",
    );
    assert_eq!(stored.title, target.title);
    assert_eq!(stored.images, target.images);
}

#[tokio::test]
async fn test_delete_cascades_images() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("delete_cascade");

    let created = repo
        .create(create_input(&builder, "main", vec![builder.image_url(0), builder.image_url(1)]).into())
        .await
        .unwrap();
    assert_eq!(db.count_rows("product_images").await, 2);

    assert!(repo.delete(created.id).await.unwrap());
    assert!(!repo.delete(created.id).await.unwrap());
    assert_eq!(db.count_rows("product_images").await, 0);
}

// ============================================================================
// Service Tests
// ============================================================================

#[tokio::test]
async fn test_shirt_lifecycle() {
    let db = TestDatabase::new().await;
    let service = ProductService::new(PgProductRepository::new(db.connection()));

    let created = service
        .create(CreateProduct {
            title: "Shirt".to_string(),
            price: Some(10.0),
            description: None,
            slug: None,
            stock: None,
            sizes: vec![Size::M],
            gender: Gender::Men,
            tags: vec![],
            images: vec!["a.jpg".to_string(), "b.jpg".to_string()],
        })
        .await
        .unwrap();
    assert_eq!(created.slug, "shirt");
    assert_eq!(urls(&created), vec!["a.jpg", "b.jpg"]);

    let plain = service.find_one_plain("shirt").await.unwrap();
    assert_eq!(plain.images, vec!["a.jpg", "b.jpg"]);

    let updated = service
        .update(
            created.id,
            UpdateProduct {
                images: Some(vec!["c.jpg".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.images, vec!["c.jpg"]);
    assert_eq!(db.count_rows("product_images").await, 1);

    service.remove(created.id).await.unwrap();
    assert!(matches!(
        service.find_one("shirt").await,
        Err(ProductError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_uuid_term_never_matches_title() {
    let db = TestDatabase::new().await;
    let service = ProductService::new(PgProductRepository::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("uuid_term");

    // A product whose title is a UUID string is only reachable through its slug
    let uuid_title = builder.id().to_string();
    service
        .create(CreateProduct {
            title: uuid_title.clone(),
            slug: Some("uuid-titled".to_string()),
            ..create_input(&builder, "unused", vec![])
        })
        .await
        .unwrap();

    let err = service.find_one(&uuid_title).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("Product with id {} not found", uuid_title)
    );
    assert!(service.find_one("uuid-titled").await.is_ok());
}

#[tokio::test]
async fn test_delete_all_products_leaves_nothing() {
    let db = TestDatabase::new().await;
    let service = ProductService::new(PgProductRepository::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("delete_all");

    for suffix in ["a", "b"] {
        service
            .create(create_input(&builder, suffix, vec![builder.image_url(0)]))
            .await
            .unwrap();
    }

    assert_eq!(service.delete_all_products().await.unwrap(), 2);
    assert_eq!(db.count_rows("products").await, 0);
    assert_eq!(db.count_rows("product_images").await, 0);
}
