/// Offset/limit page of a filtered, sorted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaginationWindow {
    offset: u64,
    limit: u64,
}

impl PaginationWindow {
    /// Page size used when the request names none.
    pub const DEFAULT_LIMIT: u64 = 10;

    /// Largest offset or limit a window carries; storage binds both as signed 64-bit.
    pub const MAX_BOUND: u64 = i64::MAX as u64;

    /// Creates a window; limits below one are raised to one and both values are
    /// capped at [`Self::MAX_BOUND`].
    #[must_use]
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset: offset.min(Self::MAX_BOUND),
            limit: limit.clamp(1, Self::MAX_BOUND),
        }
    }

    /// Builds a window from half-open `[start, end)` bounds.
    #[must_use]
    pub fn from_bounds(start: i64, end: i64) -> Self {
        let start = start.max(0);
        Self::new(non_negative(start), non_negative(end.saturating_sub(start)))
    }

    /// Builds a window from a 1-based page number and page size.
    #[must_use]
    pub fn from_page(current_page: i64, page_size: i64) -> Self {
        let page = non_negative(current_page.max(1));
        let size = non_negative(page_size.max(1));
        Self::new((page - 1).saturating_mul(size), size)
    }

    /// Reconciles both encodings; explicit bounds win when both are given.
    #[must_use]
    pub fn from_params(
        start: Option<i64>,
        end: Option<i64>,
        current_page: Option<i64>,
        page_size: Option<i64>,
    ) -> Self {
        if let (Some(start), Some(end)) = (start, end) {
            return Self::from_bounds(start, end);
        }

        if current_page.is_some() || page_size.is_some() {
            return Self::from_page(
                current_page.unwrap_or(1),
                page_size.unwrap_or(Self::DEFAULT_LIMIT as i64),
            );
        }

        Self::default()
    }

    /// Returns the number of skipped items.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the maximum page size.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

/// Slices a collection, returning the page and the pre-slice total.
#[must_use]
pub fn apply_pagination<T>(items: Vec<T>, window: PaginationWindow) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let offset = usize::try_from(window.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(window.limit()).unwrap_or(usize::MAX);
    let page = items.into_iter().skip(offset).take(limit).collect();

    (page, total)
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
