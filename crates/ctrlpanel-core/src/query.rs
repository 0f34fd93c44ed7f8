//! Paging, sorting and filter parameters for list requests.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Page sizes offered by list screens.
pub const PAGE_SIZES: [u32; 5] = [1, 10, 20, 50, 100];

/// Page size used until the operator picks another one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Sort direction of a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// Sort key: a field name (dot notation for nested fields) plus direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Field name, e.g. `serialNumber` or `eventType.eventCode`.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

impl Sort {
    /// Ascending sort on `field`.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending sort on `field`.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Apply a header click: flip on the active field, otherwise select
    /// `field` ascending.
    #[must_use]
    pub fn toggled(&self, field: &str) -> Self {
        if self.field == field {
            Self {
                field: self.field.clone(),
                direction: self.direction.flipped(),
            }
        } else {
            Self::asc(field)
        }
    }
}

impl Display for Sort {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{},{}", self.field, self.direction.as_str())
    }
}

impl FromStr for Sort {
    type Err = String;

    /// Parse `field` or `field,direction`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match value.split_once(',') {
            Some((field, direction)) => (field.trim(), direction.parse::<SortDirection>()?),
            None => (value.trim(), SortDirection::Asc),
        };
        if field.is_empty() {
            return Err("sort field must not be empty".to_string());
        }
        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// Full parameter set of one list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Zero-based page index.
    pub page: u32,
    /// Page size.
    pub size: u32,
    /// Optional sort key; omitted from the request when `None`.
    pub sort: Option<Sort>,
    /// Filter values by field; empty values are not sent.
    pub filters: BTreeMap<String, String>,
}

impl ListQuery {
    /// First page of `size` items with no sort and no filters.
    #[must_use]
    pub const fn first_page(size: u32) -> Self {
        Self {
            page: 0,
            size,
            sort: None,
            filters: BTreeMap::new(),
        }
    }

    /// Query parameters in request order: `page`, `size`, `sortBy`, then
    /// non-empty filters.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("size".to_string(), self.size.to_string()),
        ];
        if let Some(sort) = &self.sort {
            pairs.push(("sortBy".to_string(), sort.to_string()));
        }
        pairs.extend(
            self.filters
                .iter()
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(field, value)| (field.clone(), value.trim().to_string())),
        );
        pairs
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::first_page(DEFAULT_PAGE_SIZE)
    }
}

/// Whether `size` is one of [`PAGE_SIZES`].
#[must_use]
pub fn is_valid_page_size(size: u32) -> bool {
    PAGE_SIZES.contains(&size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_same_field_twice_restores_direction() {
        let sort = Sort::asc("serialNumber");
        let once = sort.toggled("serialNumber");
        assert_eq!(once.direction, SortDirection::Desc);
        assert_eq!(once.toggled("serialNumber"), sort);
    }

    #[test]
    fn toggling_other_field_resets_to_ascending() {
        let sort = Sort::desc("eventTime");
        assert_eq!(
            sort.toggled("eventType.eventCode"),
            Sort::asc("eventType.eventCode")
        );
    }

    #[test]
    fn sort_parses_wire_format() {
        assert_eq!(
            "controller.guid,desc".parse::<Sort>(),
            Ok(Sort::desc("controller.guid"))
        );
        assert_eq!("comment".parse::<Sort>(), Ok(Sort::asc("comment")));
        assert!("eventTime,sideways".parse::<Sort>().is_err());
        assert!(",asc".parse::<Sort>().is_err());
        assert_eq!(Sort::desc("eventTime").to_string(), "eventTime,desc");
    }

    #[test]
    fn query_pairs_skip_blank_filters() {
        let mut query = ListQuery::first_page(20);
        query.page = 3;
        query.sort = Some(Sort::asc("eventCode"));
        query.filters.insert("comment".into(), "  ".into());
        query.filters.insert("controllerSerialNumber".into(), " SN-1 ".into());
        assert_eq!(
            query.query_pairs(),
            vec![
                ("page".to_string(), "3".to_string()),
                ("size".to_string(), "20".to_string()),
                ("sortBy".to_string(), "eventCode,asc".to_string()),
                ("controllerSerialNumber".to_string(), "SN-1".to_string()),
            ]
        );
    }

    #[test]
    fn page_sizes_are_restricted() {
        assert!(is_valid_page_size(1));
        assert!(is_valid_page_size(100));
        assert!(!is_valid_page_size(0));
        assert!(!is_valid_page_size(25));
    }
}
