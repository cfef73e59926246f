/// One window over an ordered slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub index: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub total_pages: usize,
}

/// Zero-based window of `size` items starting at `index * size`.
///
/// An index past the end, or a zero page size, yields an empty page with no
/// navigation in either direction.
pub fn page<T>(items: &[T], index: usize, size: usize) -> Page<'_, T> {
    let total_pages = if size == 0 { 0 } else { items.len().div_ceil(size) };
    let start = index.saturating_mul(size);

    if size == 0 || start >= items.len() {
        return Page {
            items: &[],
            index,
            has_prev: false,
            has_next: false,
            total_pages,
        };
    }

    let end = start.saturating_add(size).min(items.len());
    Page {
        items: &items[start..end],
        index,
        has_prev: index > 0,
        has_next: end < items.len(),
        total_pages,
    }
}
