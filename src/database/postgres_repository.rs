use sqlx::PgPool;

/// Shared sqlx-backed repository handle. Routes construct one per request
/// from the managed pool; the per-domain traits it implements live next to
/// their queries.
#[derive(Clone)]
pub struct PostgresRepository {
    pub pool: PgPool,
}
