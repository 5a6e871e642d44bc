use snowflake::SnowflakeIdBucket;

/// Snowflake-backed ID source for alerts and rules.
///
/// Owned by whichever component creates records, so there is no global
/// generator state. IDs are time-ordered i64s rendered as strings, which
/// keeps them stable through JSON round-trips.
pub struct IdSource {
    bucket: SnowflakeIdBucket,
}

impl IdSource {
    /// `machine_id` and `node_id` identify this process (0-31 each).
    /// Hosts embedding several engines must give each a distinct pair or
    /// their IDs may collide.
    pub fn new(machine_id: i32, node_id: i32) -> Self {
        Self {
            bucket: SnowflakeIdBucket::new(machine_id, node_id),
        }
    }

    pub fn next(&mut self) -> String {
        self.bucket.get_id().to_string()
    }
}

impl Default for IdSource {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_within_a_source() {
        let mut ids = IdSource::new(1, 1);
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let id = ids.next();
            assert!(!id.is_empty());
            assert!(seen.insert(id), "Duplicate ID generated");
        }
    }

    #[test]
    fn ids_round_trip_as_i64() {
        let mut ids = IdSource::default();
        let id = ids.next();
        assert!(id.parse::<i64>().is_ok(), "ID should be a valid i64: {id}");
    }
}
