//! HTTP handlers for Products API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestDuplicateResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::entity::TAG;
use crate::error::ProductResult;
use crate::models::{
    CreateProduct, Gender, Pagination, Product, ProductImage, ProductPlain, Size, UpdateProduct,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        delete_all_products,
        get_product,
        update_product,
        delete_product,
    ),
    components(
        schemas(
            Product, ProductPlain, ProductImage, CreateProduct, UpdateProduct,
            Pagination, Size, Gender
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestDuplicateResponse,
            BadRequestUuidResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Product catalogue endpoints")
    )
)]
pub struct ApiDoc;

/// Create the products router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route(
            "/",
            get(list_products)
                .post(create_product)
                .delete(delete_all_products),
        )
        .route(
            "/{term}",
            get(get_product)
                .patch(update_product)
                .delete(delete_product),
        )
        .with_state(shared_service)
}

/// List products, oldest first
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(Pagination),
    responses(
        (status = 200, description = "Page of products with their images", body = Vec<Product>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Query(page): Query<Pagination>,
) -> ProductResult<Json<Vec<Product>>> {
    let products = service.find_all(page).await?;
    Ok(Json(products))
}

/// Create a product with its images
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, response = BadRequestDuplicateResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> ProductResult<impl IntoResponse> {
    let product = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Delete every product and image
#[utoipa::path(
    delete,
    path = "",
    tag = TAG,
    responses(
        (status = 204, description = "All products deleted"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_all_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
) -> ProductResult<StatusCode> {
    service.delete_all_products().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get a product by id, title or slug
#[utoipa::path(
    get,
    path = "/{term}",
    tag = TAG,
    params(
        ("term" = String, Path, description = "Product UUID, title (any case) or slug")
    ),
    responses(
        (status = 200, description = "Product with image URLs", body = ProductPlain),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(term): Path<String>,
) -> ProductResult<Json<ProductPlain>> {
    let product = service.find_one_plain(&term).await?;
    Ok(Json(product))
}

/// Partially update a product; `images` replaces the whole list
#[utoipa::path(
    patch,
    path = "/{term}",
    tag = TAG,
    params(
        ("term" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Updated product with image URLs", body = ProductPlain),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> ProductResult<Json<ProductPlain>> {
    let product = service.update(id, input).await?;
    Ok(Json(product))
}

/// Delete a product and its images
#[utoipa::path(
    delete,
    path = "/{term}",
    tag = TAG,
    params(
        ("term" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    UuidPath(id): UuidPath,
) -> ProductResult<StatusCode> {
    service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
