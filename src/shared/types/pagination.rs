pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Pagination query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: u32,
    pub limit: u32,
}

impl PaginationParams {
    /// Page is 1-based; limit is clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Paginated response wrapper
#[derive(Debug)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = total.div_ceil(limit.max(1) as u64) as u32;
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_are_clamped() {
        let p = PaginationParams::new(Some(0), Some(1000));
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, MAX_PAGE_LIMIT);

        let p = PaginationParams::new(None, Some(0));
        assert_eq!(p.limit, 1);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PaginationParams::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PaginatedResult::new(vec![1, 2], 101, 1, 50);
        assert_eq!(page.total_pages, 3);
        let empty: PaginatedResult<u8> = PaginatedResult::new(vec![], 0, 1, 50);
        assert_eq!(empty.total_pages, 0);
    }
}
