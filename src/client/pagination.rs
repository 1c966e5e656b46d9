//! GitLab offset pagination headers

use reqwest::header::HeaderMap;

use super::error::{ClientError, Result};

pub const NEXT_PAGE: &str = "x-next-page";
pub const PAGE: &str = "x-page";
pub const PER_PAGE: &str = "x-per-page";
pub const PREV_PAGE: &str = "x-prev-page";
pub const TOTAL: &str = "x-total";
pub const TOTAL_PAGES: &str = "x-total-pages";

/// Pagination state reported by a GitLab list endpoint.
///
/// GitLab sends empty header values on the first/last page, and may omit
/// `x-total`/`x-total-pages` for large collections. Missing or empty values
/// are `None`. A garbled `x-next-page` is an error since reading it as
/// "last page" would truncate the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationInfo {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
    pub total: Option<u32>,
    pub total_pages: Option<u32>,
}

impl PaginationInfo {
    /// Reads the headers of one page of `resource`
    pub fn from_headers(headers: &HeaderMap, resource: &str) -> Result<Self> {
        let next_page = match header_str(headers, NEXT_PAGE) {
            Some(raw) => Some(raw.parse::<u32>().map_err(|e| {
                ClientError::decode(resource, format!("invalid {NEXT_PAGE} header {raw:?}: {e}"))
            })?),
            None => None,
        };

        Ok(Self {
            page: header_u32(headers, PAGE),
            per_page: header_u32(headers, PER_PAGE),
            next_page,
            prev_page: header_u32(headers, PREV_PAGE),
            total: header_u32(headers, TOTAL),
            total_pages: header_u32(headers, TOTAL_PAGES),
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    header_str(headers, name).and_then(|v| v.parse().ok())
}
