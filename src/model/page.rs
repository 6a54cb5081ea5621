use serde::Serialize;

/// The fixed number of records returned by a paginated list.
pub const PER_PAGE: u32 = 20;

/// A 1-indexed page number. Anything missing, unparsable or below 1 is page 1.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PageRequest {
    page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1 }
    }
}

impl PageRequest {
    pub fn new(page: u32) -> Self {
        Self { page: page.max(1) }
    }

    /// Interprets a raw `page` query parameter.
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse::<u32>().ok())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub(crate) fn limit(&self) -> i64 {
        i64::from(PER_PAGE)
    }

    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(PER_PAGE)
    }
}

/// One page of an ordered collection.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, data: Vec<T>, total_count: u64) -> Self {
        Self {
            data,
            page: request.page(),
            per_page: PER_PAGE,
            total_count,
            total_pages: total_count.div_ceil(u64::from(PER_PAGE)),
        }
    }
}
