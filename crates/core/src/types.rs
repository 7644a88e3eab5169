/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Snapshot versions increase by one on every configuration mutation.
pub type SnapshotVersion = u64;

/// Absolute tolerance used when comparing monetary amounts.
pub const MONEY_EPSILON: f64 = 1e-6;

/// Compare two monetary amounts within [`MONEY_EPSILON`], scaled for large values.
pub fn money_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= MONEY_EPSILON * a.abs().max(b.abs()).max(1.0)
}
