use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, FieldError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A column a resource allows callers to sort by.
pub trait SortField: Copy + Debug + Send + Sync + 'static {
    /// Accepted `sort_by` values, in the order they are reported back on error.
    const ALLOWED: &'static [&'static str];

    fn parse(raw: &str) -> Option<Self>;

    /// SQL column expression. Must only ever return a fixed identifier.
    fn column(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F> SortKey<F> {
    pub fn asc(field: F) -> Self {
        SortKey {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: F) -> Self {
        SortKey {
            field,
            direction: SortDirection::Desc,
        }
    }
}

/// Raw `?page=&limit=&sort_by=&sort_direction=` parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

/// A resolved, 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Applies defaults and clamps `limit` to `max_limit`. Non-positive values are rejected.
    pub fn resolve(
        page: Option<i64>,
        limit: Option<i64>,
        default_limit: u32,
        max_limit: u32,
    ) -> Result<Self, AppError> {
        let mut errors = Vec::new();
        let page = page.unwrap_or(1);
        if page < 1 {
            errors.push(FieldError::new("page", "must be at least 1"));
        }
        let limit = limit.unwrap_or(default_limit as i64);
        if limit < 1 {
            errors.push(FieldError::new("limit", "must be at least 1"));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(PageRequest {
            page: page.min(u32::MAX as i64) as u32,
            limit: limit.min(max_limit as i64) as u32,
        })
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

/// Resolves `sort_by` / `sort_direction` against the resource allow-list.
///
/// No `sort_by` means the resource default; a direction alone is ignored.
pub fn resolve_sort<F: SortField>(
    sort_by: Option<&str>,
    sort_direction: Option<&str>,
    default: Vec<SortKey<F>>,
) -> Result<Vec<SortKey<F>>, AppError> {
    let direction = match sort_direction {
        None => SortDirection::Asc,
        Some(raw) => SortDirection::parse(raw).ok_or_else(|| {
            AppError::invalid_field("sort_direction", "must be 'asc' or 'desc'")
        })?,
    };
    match sort_by.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(raw) => {
            let field = F::parse(raw).ok_or_else(|| {
                AppError::invalid_field(
                    "sort_by",
                    format!("must be one of: {}", F::ALLOWED.join(", ")),
                )
            })?;
            Ok(vec![SortKey { field, direction }])
        }
    }
}

pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit as u64).min(u32::MAX as u64) as u32
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub total: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub limit: u32,
}

/// `{ "data": [...], "meta": {...} }` list envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, request: &PageRequest) -> Self {
        Page {
            data,
            meta: PageMeta {
                total,
                total_pages: total_pages(total, request.limit),
                current_page: request.page,
                limit: request.limit,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Field {
        Name,
        DisplayOrder,
    }

    impl SortField for Field {
        const ALLOWED: &'static [&'static str] = &["name", "display_order"];

        fn parse(raw: &str) -> Option<Self> {
            match raw {
                "name" => Some(Field::Name),
                "display_order" => Some(Field::DisplayOrder),
                _ => None,
            }
        }

        fn column(self) -> &'static str {
            match self {
                Field::Name => "name",
                Field::DisplayOrder => "display_order",
            }
        }
    }

    #[test]
    fn test_page_defaults_and_clamp() {
        let req = PageRequest::resolve(None, None, 20, 100).unwrap();
        assert_eq!(req, PageRequest { page: 1, limit: 20 });
        let req = PageRequest::resolve(Some(2), Some(500), 20, 100).unwrap();
        assert_eq!(req.limit, 100);
        assert_eq!(req.offset(), 100);
    }

    #[test]
    fn test_page_rejects_non_positive() {
        let err = PageRequest::resolve(Some(0), Some(0), 20, 100).unwrap_err();
        match err {
            AppError::Validation(fields) => assert_eq!(fields.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(30, 10), 3);
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
    }

    #[test]
    fn test_sort_defaults_when_absent() {
        let keys = resolve_sort::<Field>(None, Some("desc"), vec![SortKey::asc(Field::DisplayOrder)])
            .unwrap();
        assert_eq!(keys, vec![SortKey::asc(Field::DisplayOrder)]);
    }

    #[test]
    fn test_sort_parses_field_and_direction() {
        let keys = resolve_sort::<Field>(Some("name"), Some("DESC"), vec![]).unwrap();
        assert_eq!(keys, vec![SortKey::desc(Field::Name)]);
        assert_eq!(keys[0].field.column(), "name");
    }

    #[test]
    fn test_sort_rejects_unknown_field() {
        let err = resolve_sort::<Field>(Some("password"), None, vec![]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = resolve_sort::<Field>(Some("name"), Some("sideways"), vec![]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
