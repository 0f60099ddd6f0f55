use crate::model::{PageNum, User, Wallpaper};
use log::warn;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    pub current: PageNum,
    pub previous: Option<PageNum>,
    pub next: Option<PageNum>,
    pub per_page: u32,
    pub pages: u32,
}

/// Body of every list endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Listing<T> {
    pub response: Vec<T>,
    #[serde(default)]
    pub count: Option<usize>,
    pub pagination: Pagination,
}

/// One page of a paginated listing.
///
/// Which entity it holds is decided by the call that fetched it, not by
/// looking at the body. Walk a listing by requesting `next_page` until it is
/// `None` or a page comes back empty.
///
/// Decoding is all or nothing: an item missing a required field (a
/// wallpaper's `id`, a user's `username`) makes the whole page absent. A
/// wallpaper with a broken `image` still decodes, with `image: None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub current_page: PageNum,
    pub previous_page: Option<PageNum>,
    pub next_page: Option<PageNum>,
    pub per_page: u32,
    pub pages_count: u32,
    pub items: Vec<T>,
}

pub type UserPage = Page<User>;
pub type WallpaperPage = Page<Wallpaper>;

impl<T> Page<T> {
    pub fn items_on_page(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.next_page.is_none() || self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Listing<T> {
    pub(crate) fn into_page(self) -> Page<T> {
        let Listing {
            response,
            count,
            pagination,
        } = self;
        if let Some(count) = count {
            if count != response.len() {
                warn!(
                    "page {} reports {} items but carries {}",
                    pagination.current,
                    count,
                    response.len()
                );
            }
        }
        Page {
            current_page: pagination.current,
            previous_page: pagination.previous,
            next_page: pagination.next,
            per_page: pagination.per_page,
            pages_count: pagination.pages,
            items: response,
        }
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> fmt::Display for Page<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {}/{} ({} items, {} per page)",
            self.current_page,
            self.pages_count,
            self.items.len(),
            self.per_page
        )
    }
}
