pub mod pool;
pub mod queries;

pub use pool::create_pool;
pub use sqlx::PgPool;

/// Embedded migrations, run once at each binary's startup the same way the
/// teacher expects operators to run `sqlx migrate run` against `DATABASE_URL`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
