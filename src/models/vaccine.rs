/// A named vaccine lot and its remaining dose count. Never deleted;
/// the count is kept non-negative by guarded updates.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Lot {
    pub name: String,
    pub doses: i64,
}
