use crate::domain::product::Product;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// 1-indexed page window over an ordered sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: usize,
}

impl PageRequest {
    /// Pages below 1 are read as page 1; a zero limit falls back to the default.
    pub fn new(page: i64, limit: usize) -> Self {
        let page = u64::try_from(page).unwrap_or(0).max(1);
        let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
        Self { page, limit }
    }

    pub fn first(limit: usize) -> Self {
        Self::new(1, limit)
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        let skipped = (self.page - 1).saturating_mul(self.limit as u64);
        usize::try_from(skipped).unwrap_or(usize::MAX)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    ActiveOnly,
    All,
}

impl Visibility {
    pub fn admits(self, product: &Product) -> bool {
        match self {
            Self::ActiveOnly => is_listable(product),
            Self::All => true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: PageRequest,
    pub visibility: Visibility,
}

/// A record is listable only when its stored flag is the boolean `true`.
pub fn is_listable(product: &Product) -> bool {
    product.is_active.is_true()
}

pub fn filter<'a, P>(products: &'a [Product], predicate: P) -> Vec<&'a Product>
where
    P: Fn(&Product) -> bool,
{
    products.iter().filter(|product| predicate(*product)).collect()
}

pub fn filter_active(products: &[Product]) -> Vec<&Product> {
    filter(products, is_listable)
}

/// Slices `[offset, offset + limit)` out of `items`, clipped to its bounds.
pub fn paginate<T: Clone>(items: &[T], page: PageRequest) -> Vec<T> {
    items.iter().skip(page.offset()).take(page.limit()).cloned().collect()
}

/// Filter then paginate, the whole of a list read.
pub fn run(products: &[Product], query: ListQuery) -> Vec<Product> {
    let visible = filter(products, |product| query.visibility.admits(product));
    paginate(&visible, query.page).into_iter().cloned().collect()
}
