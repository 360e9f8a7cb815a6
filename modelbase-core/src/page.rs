//! Pagination support: page arithmetic and the pooled find-page option object.
//!
//! [`FindPageOptions`] describes the field projection and sort order of a
//! paged query. Instances are transient: they are acquired from a
//! process-wide reuse pool with [`FindPageOptions::acquire`], used for a
//! single paged query, and cleared and returned to the pool when the
//! returned guard drops, on every exit path including the error path.

use bson::{Document, doc};
use serde::{Deserialize, Serialize};
use std::{
    mem,
    ops::{Deref, DerefMut},
    sync::{Mutex, PoisonError},
};

/// Sort direction for a paged query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

impl SortOrder {
    fn as_i32(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

/// Field projection and sort order for a paged query.
///
/// The selector maps field names to an include/exclude intent; the sort
/// keys are an ordered sequence applied in the order they were added.
#[derive(Debug, Default)]
pub struct FindPageOptions {
    selector: Document,
    sort: Vec<(String, SortOrder)>,
}

impl FindPageOptions {
    /// Creates an empty option object outside the pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires an option object from the reuse pool.
    ///
    /// The returned guard dereferences to [`FindPageOptions`]; when it
    /// drops, the object is cleared and released back to the pool. Each
    /// acquired object is exclusively owned by the caller until then.
    pub fn acquire() -> PooledFindPageOptions {
        let inner = pool()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();

        PooledFindPageOptions(inner)
    }

    /// Adds `field` to the projection, included when `include` is true and
    /// excluded otherwise.
    pub fn select(&mut self, field: impl Into<String>, include: bool) -> &mut Self {
        self.selector
            .insert(field.into(), if include { 1 } else { 0 });
        self
    }

    /// Appends a sort key. Keys are applied in insertion order.
    pub fn sort(&mut self, field: impl Into<String>, order: SortOrder) -> &mut Self {
        self.sort.push((field.into(), order));
        self
    }

    /// Resets both the selector and the sort keys to empty.
    pub fn clear(&mut self) {
        self.selector.clear();
        self.sort.clear();
    }

    /// Returns true while neither a projection nor a sort key has been set.
    pub fn is_empty(&self) -> bool {
        self.selector.is_empty() && self.sort.is_empty()
    }

    /// Returns the projection as a driver document, or `None` when unset.
    pub fn projection_document(&self) -> Option<Document> {
        if self.selector.is_empty() {
            None
        } else {
            Some(self.selector.clone())
        }
    }

    /// Returns the sort keys as a driver document, or `None` when unset.
    pub fn sort_document(&self) -> Option<Document> {
        if self.sort.is_empty() {
            return None;
        }

        let mut sort = doc! {};
        for (field, order) in &self.sort {
            sort.insert(field.clone(), order.as_i32());
        }

        Some(sort)
    }
}

/// RAII guard around a pooled [`FindPageOptions`].
///
/// Dropping the guard clears the object and returns it to the pool,
/// guaranteeing clear-and-release on every exit path.
#[derive(Debug)]
pub struct PooledFindPageOptions(FindPageOptions);

impl Deref for PooledFindPageOptions {
    type Target = FindPageOptions;

    fn deref(&self) -> &FindPageOptions {
        &self.0
    }
}

impl DerefMut for PooledFindPageOptions {
    fn deref_mut(&mut self) -> &mut FindPageOptions {
        &mut self.0
    }
}

impl Drop for PooledFindPageOptions {
    fn drop(&mut self) {
        let mut inner = mem::take(&mut self.0);
        inner.clear();
        pool()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(inner);
    }
}

fn pool() -> &'static Mutex<Vec<FindPageOptions>> {
    static POOL: Mutex<Vec<FindPageOptions>> = Mutex::new(Vec::new());
    &POOL
}

/// Computes the number of pages needed for `total` documents at
/// `page_size` documents per page: `ceil(total / page_size)` in integer
/// arithmetic. A zero page size yields zero pages.
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    if total % page_size == 0 {
        total / page_size
    } else {
        total / page_size + 1
    }
}

/// Computes the `(offset, size)` slice for 1-indexed `current_page`.
///
/// Returns `None` when the page lies past the last document, so the caller
/// can short-circuit instead of issuing a zero-or-negative-size query.
pub fn page_slice(total: u64, page_size: u64, current_page: u64) -> Option<(u64, i64)> {
    if page_size == 0 || current_page == 0 {
        return None;
    }

    let offset = match (current_page - 1).checked_mul(page_size) {
        Some(offset) if offset < total => offset,
        // Overflowing offsets are past the end by definition.
        _ => return None,
    };

    Some((offset, page_size.min(total - offset) as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_integer_ceiling() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(30, 10), 3);

        for total in 0..200u64 {
            for page_size in 1..20u64 {
                assert_eq!(total_pages(total, page_size), total.div_ceil(page_size));
            }
        }
    }

    #[test]
    fn page_slice_matches_spec_scenario() {
        // 25 documents, 10 per page, page 3: skip 20, fetch the last 5.
        assert_eq!(page_slice(25, 10, 3), Some((20, 5)));
        assert_eq!(page_slice(25, 10, 1), Some((0, 10)));
        assert_eq!(page_slice(25, 10, 2), Some((10, 10)));
    }

    #[test]
    fn page_slice_past_the_end_is_none() {
        assert_eq!(page_slice(25, 10, 4), None);
        assert_eq!(page_slice(0, 10, 1), None);
        assert_eq!(page_slice(10, 10, 2), None);
    }

    #[test]
    fn page_slice_survives_huge_page_numbers() {
        // An offset that would overflow u64 is past the end, not a panic.
        assert_eq!(page_slice(25, 10, u64::MAX), None);
        assert_eq!(page_slice(u64::MAX, u64::MAX, 2), None);
    }

    #[test]
    fn page_slice_rejects_zero_inputs() {
        assert_eq!(page_slice(25, 0, 1), None);
        assert_eq!(page_slice(25, 10, 0), None);
    }

    #[test]
    fn options_build_projection_and_sort_documents() {
        let mut options = FindPageOptions::new();
        options
            .select("name", true)
            .select("secret", false)
            .sort("create_time", SortOrder::Desc)
            .sort("name", SortOrder::Asc);

        assert_eq!(
            options.projection_document(),
            Some(doc! { "name": 1, "secret": 0 })
        );
        assert_eq!(
            options.sort_document(),
            Some(doc! { "create_time": -1, "name": 1 })
        );
    }

    #[test]
    fn released_options_come_back_empty() {
        {
            let mut options = FindPageOptions::acquire();
            options
                .select("name", true)
                .sort("name", SortOrder::Asc);
            assert!(!options.is_empty());
        }

        let options = FindPageOptions::acquire();
        assert!(options.is_empty());
        assert_eq!(options.projection_document(), None);
        assert_eq!(options.sort_document(), None);
    }

    #[test]
    fn pool_survives_concurrent_acquire_release() {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let mut options = FindPageOptions::acquire();
                        options.select(format!("field{i}"), true);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(FindPageOptions::acquire().is_empty());
    }
}
