use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(ProductGender::Enum)
                    .values([
                        ProductGender::Men,
                        ProductGender::Women,
                        ProductGender::Kid,
                        ProductGender::Unisex,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(pk_uuid(Products::Id))
                    .col(string_len(Products::Title, 200).unique_key())
                    .col(double(Products::Price).default(0.0))
                    .col(text_null(Products::Description))
                    .col(string(Products::Slug).unique_key())
                    .col(integer(Products::Stock).default(0))
                    .col(json_binary(Products::Sizes).default("[]"))
                    .col(
                        ColumnDef::new(Products::Gender)
                            .enumeration(
                                ProductGender::Enum,
                                [
                                    ProductGender::Men,
                                    ProductGender::Women,
                                    ProductGender::Kid,
                                    ProductGender::Unisex,
                                ],
                            )
                            .not_null(),
                    )
                    .col(json_binary(Products::Tags).default("[]"))
                    .col(
                        timestamp_with_time_zone(Products::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Products::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // List order
        manager
            .create_index(
                Index::create()
                    .name("idx_products_created_at_id")
                    .table(Products::Table)
                    .col(Products::CreatedAt)
                    .col(Products::Id)
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();

        db.execute_unprepared(
            r#"
            ALTER TABLE products
                ADD CONSTRAINT chk_products_price_non_negative CHECK (price >= 0),
                ADD CONSTRAINT chk_products_stock_non_negative CHECK (stock >= 0)
            "#,
        )
        .await?;

        // Case-insensitive title lookup
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_products_upper_title ON products (UPPER(title))",
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TRIGGER products_touch_updated_at
                BEFORE UPDATE ON products
                FOR EACH ROW
                EXECUTE FUNCTION util.touch_updated_at()
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TRIGGER IF EXISTS products_touch_updated_at ON products")
            .await?;

        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(ProductGender::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Products {
    Table,
    Id,
    Title,
    Price,
    Description,
    Slug,
    Stock,
    Sizes,
    Gender,
    Tags,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProductGender {
    #[sea_orm(iden = "product_gender")]
    Enum,
    #[sea_orm(iden = "men")]
    Men,
    #[sea_orm(iden = "women")]
    Women,
    #[sea_orm(iden = "kid")]
    Kid,
    #[sea_orm(iden = "unisex")]
    Unisex,
}
