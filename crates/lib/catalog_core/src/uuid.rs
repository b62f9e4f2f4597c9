//! Time-ordered row ids.
//!
//! Row ids for users and refresh tokens are generated app-side so the
//! in-memory and Postgres stores hand out ids the same way. Refresh token
//! *values* are not generated here: they must be unguessable, see
//! `auth::refresh`.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_version_7() {
        assert_eq!(uuidv7().get_version_num(), 7);
    }

    #[test]
    fn ids_sort_by_creation() {
        let ids: Vec<Uuid> = (0..8).map(|_| uuidv7()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
