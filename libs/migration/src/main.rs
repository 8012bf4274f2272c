//! Schema CLI: `cargo run -p migration -- up` (reads `DATABASE_URL`).
//! The services apply the same migrations at startup unless `RUN_MIGRATIONS=false`.

use sea_orm_migration::cli::run_cli;

#[tokio::main]
async fn main() {
    run_cli(migration::Migrator).await;
}
