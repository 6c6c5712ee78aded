//! Dynamic query construction: a sparse set of equality filters plus
//! page/limit become a bounded, store-agnostic `QuerySpec`.
//!
//! Filters arrive as raw boundary strings (empty == absent). At least one
//! must be present; an unfiltered full-table scan is refused outright.

use std::collections::HashMap;

use crate::ApiError;

// ── FilterSet ────────────────────────────────────────────────────────────

/// The six optional equality filters exactly as they arrived at the
/// boundary. Values are matched verbatim; no trimming, no patterns.
#[derive(Debug, Clone, Default)]
pub(crate) struct PersonFilter {
    pub(crate) name: String,
    pub(crate) surname: String,
    pub(crate) patronymic: String,
    pub(crate) gender: String,
    pub(crate) age: String,
    pub(crate) nationality: String,
}

impl PersonFilter {
    pub(crate) fn from_params(params: &HashMap<String, String>) -> Self {
        let field = |key: &str| params.get(key).cloned().unwrap_or_default();
        PersonFilter {
            name: field("name"),
            surname: field("surname"),
            patronymic: field("patronymic"),
            gender: field("gender"),
            age: field("age"),
            nationality: field("nationality"),
        }
    }

    fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.surname.is_empty()
            && self.patronymic.is_empty()
            && self.gender.is_empty()
            && self.age.is_empty()
            && self.nationality.is_empty()
    }
}

// ── QuerySpec ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FilterField {
    Name,
    Surname,
    Patronymic,
    Gender,
    Nationality,
    Age,
}

impl FilterField {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Surname => "surname",
            Self::Patronymic => "patronymic",
            Self::Gender => "gender",
            Self::Nationality => "nationality",
            Self::Age => "age",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FilterValue {
    Text(String),
    Number(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Predicate {
    pub(crate) field: FilterField,
    pub(crate) value: FilterValue,
}

/// Resolved retrieval request: AND-composed equality predicates, then
/// offset/limit. Executed by the store; this module performs no I/O.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QuerySpec {
    pub(crate) predicates: Vec<Predicate>,
    pub(crate) offset: u64,
    pub(crate) limit: u64,
}

// ── Builder ──────────────────────────────────────────────────────────────

fn parse_positive(name: &str, raw: &str, default: u64) -> Result<u64, ApiError> {
    if raw.is_empty() {
        return Ok(default);
    }
    match raw.parse::<u64>() {
        Ok(value) if value >= 1 => Ok(value),
        Ok(_) => Err(ApiError::validation(format!(
            "{name} must be a positive integer"
        ))),
        Err(_) => Err(ApiError::validation(format!("invalid {name}: {raw}"))),
    }
}

/// Translate filters + pagination into a `QuerySpec`.
///
/// `limit` defaults to 10 and `page` to 1 when blank; both must otherwise
/// parse as positive integers. `max_limit`, when set, clamps oversized
/// limits (the original service ran unbounded). Offset is
/// `(page - 1) * limit`, computed after validation.
pub(crate) fn build_query(
    filter: &PersonFilter,
    limit_raw: &str,
    page_raw: &str,
    max_limit: Option<u64>,
) -> Result<QuerySpec, ApiError> {
    if filter.is_empty() {
        return Err(ApiError::validation(
            "you must specify at least one search parameter",
        ));
    }

    let mut limit = parse_positive("limit", limit_raw, 10)?;
    let page = parse_positive("page", page_raw, 1)?;
    if let Some(cap) = max_limit {
        limit = limit.min(cap);
    }

    let mut predicates = Vec::new();
    let text_fields = [
        (FilterField::Name, &filter.name),
        (FilterField::Surname, &filter.surname),
        (FilterField::Patronymic, &filter.patronymic),
        (FilterField::Gender, &filter.gender),
        (FilterField::Nationality, &filter.nationality),
    ];
    for (field, raw) in text_fields {
        if !raw.is_empty() {
            predicates.push(Predicate {
                field,
                value: FilterValue::Text(raw.clone()),
            });
        }
    }
    if !filter.age.is_empty() {
        let age = filter
            .age
            .parse::<i64>()
            .map_err(|_| ApiError::validation(format!("invalid age filter: {}", filter.age)))?;
        predicates.push(Predicate {
            field: FilterField::Age,
            value: FilterValue::Number(age),
        });
    }

    Ok(QuerySpec {
        predicates,
        offset: (page - 1) * limit,
        limit,
    })
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn name_filter(name: &str) -> PersonFilter {
        PersonFilter {
            name: name.to_string(),
            ..PersonFilter::default()
        }
    }

    #[test]
    fn test_all_empty_filters_rejected() {
        let err = build_query(&PersonFilter::default(), "", "", None).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        // page/limit do not rescue an empty filter set
        let err = build_query(&PersonFilter::default(), "10", "1", None).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_defaults() {
        let spec = build_query(&name_filter("A"), "", "", None).unwrap();
        assert_eq!(spec.limit, 10);
        assert_eq!(spec.offset, 0);
    }

    #[test]
    fn test_offset_arithmetic() {
        let spec = build_query(&name_filter("A"), "5", "2", None).unwrap();
        assert_eq!(spec.limit, 5);
        assert_eq!(spec.offset, 5);

        let spec = build_query(&name_filter("A"), "20", "4", None).unwrap();
        assert_eq!(spec.offset, 60);
    }

    #[test]
    fn test_non_numeric_pagination_rejected() {
        assert!(build_query(&name_filter("A"), "ten", "1", None).is_err());
        assert!(build_query(&name_filter("A"), "10", "x", None).is_err());
        assert!(build_query(&name_filter("A"), "-5", "1", None).is_err());
    }

    #[test]
    fn test_zero_pagination_rejected() {
        assert!(build_query(&name_filter("A"), "0", "1", None).is_err());
        assert!(build_query(&name_filter("A"), "10", "0", None).is_err());
    }

    #[test]
    fn test_limit_clamped_to_cap() {
        let spec = build_query(&name_filter("A"), "500", "1", Some(100)).unwrap();
        assert_eq!(spec.limit, 100);
        // Unbounded when the cap is off
        let spec = build_query(&name_filter("A"), "500", "1", None).unwrap();
        assert_eq!(spec.limit, 500);
        // The cap never inflates a small limit
        let spec = build_query(&name_filter("A"), "5", "1", Some(100)).unwrap();
        assert_eq!(spec.limit, 5);
    }

    #[test]
    fn test_age_filter_parses_to_number() {
        let filter = PersonFilter {
            age: "34".to_string(),
            ..PersonFilter::default()
        };
        let spec = build_query(&filter, "", "", None).unwrap();
        assert_eq!(
            spec.predicates,
            vec![Predicate {
                field: FilterField::Age,
                value: FilterValue::Number(34),
            }]
        );
    }

    #[test]
    fn test_bad_age_filter_rejected() {
        let filter = PersonFilter {
            age: "old".to_string(),
            ..PersonFilter::default()
        };
        assert!(build_query(&filter, "", "", None).is_err());
    }

    #[test]
    fn test_predicates_cover_all_supplied_fields() {
        let filter = PersonFilter {
            name: "Ann".to_string(),
            gender: "female".to_string(),
            nationality: "US".to_string(),
            ..PersonFilter::default()
        };
        let spec = build_query(&filter, "", "", None).unwrap();
        assert_eq!(spec.predicates.len(), 3);
        let columns: Vec<&str> = spec.predicates.iter().map(|p| p.field.column()).collect();
        assert_eq!(columns, vec!["name", "gender", "nationality"]);
    }

    #[test]
    fn test_from_params_picks_known_fields_only() {
        let mut params = std::collections::HashMap::new();
        params.insert("name".to_string(), "Ann".to_string());
        params.insert("limit".to_string(), "3".to_string());
        params.insert("bogus".to_string(), "x".to_string());
        let filter = PersonFilter::from_params(&params);
        assert_eq!(filter.name, "Ann");
        assert!(filter.surname.is_empty());
    }
}
