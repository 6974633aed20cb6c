//! Migration CLI for the products schema.
//!
//! Reads `DATABASE_URL`; run `migration up`, `migration down`, `migration status`.

use migration::Migrator;
use sea_orm_migration::cli;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
