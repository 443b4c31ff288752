//! crates/care_directory_core/src/page.rs
//!
//! The pagination contract shared by the record stores and the services:
//! page requests with a closed set of sort keys per record type, and the
//! page object returned to callers.

use std::str::FromStr;

use crate::ports::{PortError, PortResult};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// `desc` in any case is descending; anything else is ascending.
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }
}

//=========================================================================================
// Sort Keys
//=========================================================================================

// Callers spell fields in camelCase, snake_case or the legacy regional names.
fn sort_token(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn unknown_sort(raw: &str) -> PortError {
    PortError::InvalidInput(format!("cannot sort by '{}'", raw))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PharmacySort {
    Id,
    #[default]
    Name,
    Region,
    District,
    OpenTonight,
}

impl FromStr for PharmacySort {
    type Err = PortError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match sort_token(raw).as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "region" | "willaya" => Ok(Self::Region),
            "district" | "moughataa" => Ok(Self::District),
            "opentonight" | "isopentonight" => Ok(Self::OpenTonight),
            _ => Err(unknown_sort(raw)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CabinetSort {
    #[default]
    Id,
    Name,
    Region,
    District,
}

impl FromStr for CabinetSort {
    type Err = PortError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match sort_token(raw).as_str() {
            "id" => Ok(Self::Id),
            "name" | "nom" => Ok(Self::Name),
            "region" | "willaya" => Ok(Self::Region),
            "district" | "moughataa" => Ok(Self::District),
            _ => Err(unknown_sort(raw)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoctorSort {
    #[default]
    Id,
    Name,
    Speciality,
}

impl FromStr for DoctorSort {
    type Err = PortError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match sort_token(raw).as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "speciality" => Ok(Self::Speciality),
            _ => Err(unknown_sort(raw)),
        }
    }
}

//=========================================================================================
// Page Request / Page
//=========================================================================================

/// Zero-based page index, page size and ordering requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<S> {
    pub page: u32,
    pub size: u32,
    pub sort: S,
    pub direction: SortDirection,
}

impl<S> PageRequest<S> {
    /// Rejects an empty page size and clamps oversized ones to [`MAX_PAGE_SIZE`].
    pub fn new(page: u32, size: u32, sort: S, direction: SortDirection) -> PortResult<Self> {
        if size == 0 {
            return Err(PortError::InvalidInput(
                "page size must not be less than one".to_string(),
            ));
        }
        Ok(Self {
            page,
            size: size.min(MAX_PAGE_SIZE),
            sort,
            direction,
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl<S: Default> Default for PageRequest<S> {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: S::default(),
            direction: SortDirection::Ascending,
        }
    }
}

/// One page of results plus the total number of matching records.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page: u32, size: u32, total_elements: u64) -> Self {
        Self {
            content,
            page,
            size,
            total_elements,
        }
    }

    /// Paginates a fully materialised, already ordered list.
    ///
    /// A page index past the end yields empty content with the real total.
    pub fn slice(items: Vec<T>, page: u32, size: u32) -> Self {
        let total = items.len();
        let start = (page as usize).saturating_mul(size as usize);
        let end = start.saturating_add(size as usize).min(total);

        let content = if start < end {
            items.into_iter().skip(start).take(end - start).collect()
        } else {
            Vec::new()
        };

        Self::new(content, page, size, total as u64)
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}
