//! Query parameters for the filtered read path
//!
//! These types carry what a caller asked for. Validation and defaulting
//! live here; the storage layer only translates an already-valid request.

use crate::date::validate_calendar_date;
use crate::DomainError;
use serde::{Deserialize, Serialize};

/// Default page size when the caller gives none
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page a caller may request
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Text fields that support substring filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    /// `court`
    Court,
    /// `office`
    Office,
    /// `language`
    Language,
    /// `decisionType`
    DecisionType,
    /// `caseNumber`
    CaseNumber,
}

/// Filter criteria; every present criterion must match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionFilter {
    /// Substring of the court
    #[serde(default)]
    pub court: Option<String>,

    /// Substring of the office
    #[serde(default)]
    pub office: Option<String>,

    /// Substring of the language code
    #[serde(default)]
    pub language: Option<String>,

    /// Substring of the decision type
    #[serde(default)]
    pub decision_type: Option<String>,

    /// Substring of the case number
    #[serde(default)]
    pub case_number: Option<String>,

    /// Inclusive lower bound on `dateOfDecision` (`YYYY-MM-DD`)
    #[serde(default)]
    pub date_from: Option<String>,

    /// Inclusive upper bound on `dateOfDecision` (`YYYY-MM-DD`)
    #[serde(default)]
    pub date_to: Option<String>,
}

/// Treat absent, empty and whitespace-only values alike
fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl ExtractionFilter {
    /// Validate the date bounds
    ///
    /// Both bounds must be calendar dates, and `date_from` may not exceed
    /// `date_to`. The format is zero-padded, so string comparison is
    /// chronological comparison.
    pub fn validate(&self) -> Result<(), DomainError> {
        let (from, to) = self.date_bounds();

        if let Some(from) = from {
            validate_calendar_date("dateFrom", from)?;
        }
        if let Some(to) = to {
            validate_calendar_date("dateTo", to)?;
        }
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(DomainError::InvalidDateRange {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Trimmed, non-empty text criteria in a fixed field order
    pub fn text_predicates(&self) -> Vec<(TextField, &str)> {
        [
            (TextField::Court, &self.court),
            (TextField::Office, &self.office),
            (TextField::Language, &self.language),
            (TextField::DecisionType, &self.decision_type),
            (TextField::CaseNumber, &self.case_number),
        ]
        .into_iter()
        .filter_map(|(field, value)| present(value).map(|v| (field, v)))
        .collect()
    }

    /// Date bounds that are present (not trimmed; validation sees them verbatim)
    pub fn date_bounds(&self) -> (Option<&str>, Option<&str>) {
        (date_bound(&self.date_from), date_bound(&self.date_to))
    }
}

fn date_bound(value: &Option<String>) -> Option<&str> {
    present(value).and(value.as_deref())
}

/// Sortable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Creation time
    CreatedAt,
    /// Decision date
    DateOfDecision,
    /// Title
    Title,
    /// Case number
    CaseNumber,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

/// Sort specification; both parts are needed for it to take effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSort {
    /// Field to sort on
    #[serde(default)]
    pub field: Option<SortField>,

    /// Direction
    #[serde(default)]
    pub order: Option<SortOrder>,
}

impl ExtractionSort {
    /// Resolve to a concrete field and direction
    ///
    /// Falls back to creation time descending when the sort is missing or
    /// only partially given.
    pub fn resolve(sort: Option<&ExtractionSort>) -> (SortField, SortOrder) {
        match sort {
            Some(ExtractionSort {
                field: Some(field),
                order: Some(order),
            }) => (*field, *order),
            _ => (SortField::CreatedAt, SortOrder::Desc),
        }
    }
}

/// Pagination as requested by a caller
///
/// Signed so that negative input is reported instead of failing to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInput {
    /// Page size (1..=100, default 10)
    #[serde(default)]
    pub limit: Option<i64>,

    /// Items to skip (>= 0, default 0)
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Validated pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page size
    pub limit: u32,
    /// Items to skip
    pub offset: u64,
}

impl PaginationInput {
    /// Apply defaults and bounds; out-of-range values are rejected, not clamped
    pub fn resolve(input: Option<&PaginationInput>) -> Result<Pagination, DomainError> {
        let limit = input.and_then(|p| p.limit).unwrap_or(DEFAULT_PAGE_LIMIT as i64);
        let offset = input.and_then(|p| p.offset).unwrap_or(0);

        if limit > MAX_PAGE_LIMIT as i64 {
            return Err(DomainError::InvalidPagination(format!(
                "Limit cannot exceed {}",
                MAX_PAGE_LIMIT
            )));
        }
        if limit < 1 {
            return Err(DomainError::InvalidPagination(
                "Limit must be at least 1".to_string(),
            ));
        }
        if offset < 0 {
            return Err(DomainError::InvalidPagination(
                "Offset must not be negative".to_string(),
            ));
        }

        Ok(Pagination {
            limit: limit as u32,
            offset: offset as u64,
        })
    }
}

/// One page of results with continuation metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Matching items across all pages
    pub total: u64,
    /// Page size used
    pub limit: u32,
    /// Items skipped
    pub offset: u64,
    /// Whether items exist past this page
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Assemble a page; `has_more` is `offset + limit < total`
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            limit: pagination.limit,
            offset: pagination.offset,
            has_more: pagination.offset + u64::from(pagination.limit) < total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_is_valid() {
        let filter = ExtractionFilter::default();
        assert!(filter.validate().is_ok());
        assert!(filter.text_predicates().is_empty());
        assert_eq!(filter.date_bounds(), (None, None));
    }

    #[test]
    fn test_text_predicates_trim_and_skip_blank() {
        let filter = ExtractionFilter {
            court: Some("  Supreme ".to_string()),
            office: Some("   ".to_string()),
            case_number: Some(String::new()),
            decision_type: Some("JUDG".to_string()),
            ..Default::default()
        };
        assert_eq!(
            filter.text_predicates(),
            vec![
                (TextField::Court, "Supreme"),
                (TextField::DecisionType, "JUDG")
            ]
        );
    }

    #[test]
    fn test_date_range_rejected_when_inverted() {
        let filter = ExtractionFilter {
            date_from: Some("2024-01-02".to_string()),
            date_to: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            filter.validate(),
            Err(DomainError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_equal_bounds_allowed() {
        let filter = ExtractionFilter {
            date_from: Some("2024-01-01".to_string()),
            date_to: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        assert!(filter.validate().is_ok());
    }

    #[test]
    fn test_date_bounds_pass_values_through() {
        let filter = ExtractionFilter {
            date_from: Some("2023-06-01".to_string()),
            date_to: Some("2024-05-31".to_string()),
            ..Default::default()
        };
        assert_eq!(
            filter.date_bounds(),
            (Some("2023-06-01"), Some("2024-05-31"))
        );

        let open_ended = ExtractionFilter {
            date_to: Some("2024-05-31".to_string()),
            ..Default::default()
        };
        assert_eq!(open_ended.date_bounds(), (None, Some("2024-05-31")));
    }

    #[test]
    fn test_malformed_date_rejected() {
        let filter = ExtractionFilter {
            date_to: Some("01/02/2024".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            filter.validate(),
            Err(DomainError::InvalidDate { field: "dateTo", .. })
        ));
    }

    #[test]
    fn test_blank_date_ignored() {
        let filter = ExtractionFilter {
            date_from: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(filter.validate().is_ok());
        assert_eq!(filter.date_bounds(), (None, None));
    }

    #[test]
    fn test_sort_defaults() {
        assert_eq!(
            ExtractionSort::resolve(None),
            (SortField::CreatedAt, SortOrder::Desc)
        );
        let partial = ExtractionSort {
            field: Some(SortField::Title),
            order: None,
        };
        assert_eq!(
            ExtractionSort::resolve(Some(&partial)),
            (SortField::CreatedAt, SortOrder::Desc)
        );
        let full = ExtractionSort {
            field: Some(SortField::Title),
            order: Some(SortOrder::Asc),
        };
        assert_eq!(
            ExtractionSort::resolve(Some(&full)),
            (SortField::Title, SortOrder::Asc)
        );
    }

    #[test]
    fn test_pagination_defaults_and_bounds() {
        assert_eq!(
            PaginationInput::resolve(None).unwrap(),
            Pagination { limit: 10, offset: 0 }
        );

        let max = PaginationInput { limit: Some(100), offset: Some(5) };
        assert_eq!(
            PaginationInput::resolve(Some(&max)).unwrap(),
            Pagination { limit: 100, offset: 5 }
        );

        let too_big = PaginationInput { limit: Some(101), offset: None };
        assert!(PaginationInput::resolve(Some(&too_big)).is_err());

        let zero = PaginationInput { limit: Some(0), offset: None };
        assert!(PaginationInput::resolve(Some(&zero)).is_err());

        let negative = PaginationInput { limit: None, offset: Some(-1) };
        assert!(PaginationInput::resolve(Some(&negative)).is_err());
    }

    #[test]
    fn test_page_has_more() {
        let p = |limit, offset| Pagination { limit, offset };
        assert!(Page::new(vec![0; 5], 12, p(5, 0)).has_more);
        assert!(Page::new(vec![0; 5], 12, p(5, 5)).has_more);
        assert!(!Page::new(vec![0; 2], 12, p(5, 10)).has_more);
        assert!(!Page::new(Vec::<u8>::new(), 0, p(10, 0)).has_more);
        assert!(!Page::new(vec![0; 10], 10, p(10, 0)).has_more);
    }

    #[test]
    fn test_sort_serde_names() {
        let sort: ExtractionSort =
            serde_json::from_str(r#"{"field":"dateOfDecision","order":"asc"}"#).unwrap();
        assert_eq!(sort.field, Some(SortField::DateOfDecision));
        assert_eq!(sort.order, Some(SortOrder::Asc));
    }
}
