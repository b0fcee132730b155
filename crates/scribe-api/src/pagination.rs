//! Fixed-size pagination over an ordered collection.
//!
//! The paginator only needs the total count; the caller fetches the slice for
//! the resolved page (`offset`/`limit`) and wraps it in a [`Page`].

use serde::Serialize;

use crate::error::ApiError;
use crate::render::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Paginator {
    pub count: u64,
    pub per_page: u64,
    pub num_pages: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        // An empty collection still has one (empty) page.
        let num_pages = count.div_ceil(per_page).max(1);
        Self { count, per_page, num_pages }
    }

    /// Resolve the raw `page` query value to a page number.
    ///
    /// Missing or non-numeric values give the first page; numbers outside
    /// `1..=num_pages` give the last page.
    pub fn resolve(&self, raw: Option<&str>) -> u64 {
        let Some(raw) = raw.map(str::trim) else {
            return 1;
        };
        match raw.parse::<i64>() {
            Ok(n) if n >= 1 && (n as u64) <= self.num_pages => n as u64,
            Ok(_) => self.num_pages,
            // Integers too wide for i64 are still out of range.
            Err(_) if is_integer(raw) => self.num_pages,
            Err(_) => 1,
        }
    }

    pub fn offset(&self, number: u64) -> u64 {
        (number - 1) * self.per_page
    }

    pub fn page<T>(&self, number: u64, object_list: Vec<T>) -> Page<T> {
        Page { number, object_list, paginator: *self }
    }
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub number: u64,
    pub object_list: Vec<T>,
    paginator: Paginator,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.paginator.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    /// 1-based index of the first item on this page, 0 when there are no items.
    pub fn start_index(&self) -> u64 {
        if self.paginator.count == 0 {
            0
        } else {
            self.paginator.offset(self.number) + 1
        }
    }

    pub fn end_index(&self) -> u64 {
        if self.number == self.paginator.num_pages {
            self.paginator.count
        } else {
            self.number * self.paginator.per_page
        }
    }
}

#[derive(Serialize)]
struct PageObj<'a, T> {
    number: u64,
    object_list: &'a [T],
    has_previous: bool,
    has_next: bool,
    previous_page_number: Option<u64>,
    next_page_number: Option<u64>,
    start_index: u64,
    end_index: u64,
}

/// Builds the `paginator`, `page_number` and `page_obj` context entries.
pub fn page_context<T: Serialize>(page: &Page<T>, raw_page: Option<&str>) -> Result<Context, ApiError> {
    let page_obj = PageObj {
        number: page.number,
        object_list: &page.object_list,
        has_previous: page.has_previous(),
        has_next: page.has_next(),
        previous_page_number: page.previous_page_number(),
        next_page_number: page.next_page_number(),
        start_index: page.start_index(),
        end_index: page.end_index(),
    };

    let mut context = Context::new();
    context.insert("paginator", &page.paginator)?;
    context.insert("page_number", &raw_page)?;
    context.insert("page_obj", &page_obj)?;
    Ok(context)
}
