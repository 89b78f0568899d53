use crate::storage::types::Page;

/// Bounds applied to the `skip`/`limit` query parameters of list endpoints.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Paging {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// SQLite binds OFFSET and LIMIT as signed 64-bit integers.
const MAX_SQL_BOUND: u64 = i64::MAX as u64;

impl Paging {
    /// Resolve optional query values into a window, clamping `limit` to `max_limit`.
    /// Offsets past `i64::MAX` are pinned there; such a page is always empty.
    pub fn page(&self, skip: Option<u64>, limit: Option<u64>) -> Page {
        Page {
            skip: skip.unwrap_or(0).min(MAX_SQL_BOUND),
            limit: limit
                .unwrap_or(self.default_limit)
                .min(self.max_limit)
                .min(MAX_SQL_BOUND),
        }
    }
}
