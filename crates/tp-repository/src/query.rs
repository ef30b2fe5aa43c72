//! Query Builder
//!
//! Mutable accumulator of query intent: equality filters, a sort-key range
//! predicate, a result-count cap, and a sort direction. It performs no
//! validation beyond count/sort normalization and is designed to be passed
//! through controller call chains without exposing filter-object shape.

use serde_json::Value;
use tp_store::{FilterMap, SortDirection};

/// Read-only snapshot of the builder's count/sort state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryProps {
    pub count: Option<u32>,
    pub sort: Option<SortDirection>,
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    filters: FilterMap,
    sort_key: FilterMap,
    count: Option<u32>,
    sort: Option<SortDirection>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow-merge a partial filter into the accumulated equality filters.
    /// Last write per key wins; merging is never deep.
    pub fn add_query(&mut self, partial: impl IntoIterator<Item = (String, Value)>) -> &mut Self {
        for (field, value) in partial {
            self.filters.insert(field, value);
        }
        self
    }

    /// Shallow-merge into the separate sort-key range predicate
    /// (e.g. `between` two dates).
    pub fn add_sort_key_query(
        &mut self,
        partial: impl IntoIterator<Item = (String, Value)>,
    ) -> &mut Self {
        for (op, value) in partial {
            self.sort_key.insert(op, value);
        }
        self
    }

    /// Store a result-count cap. Positive integers (numeric or numeric
    /// string) are accepted; anything else resets the cap to unset.
    pub fn set_count(&mut self, value: Option<&Value>) -> Option<u32> {
        self.count = value.and_then(normalize_count);
        self.count
    }

    /// Store a sort direction. Accepts `"asc"`/`"ascending"`/`1` and
    /// `"desc"`/`"descending"`/`-1`; anything else resets to unset.
    pub fn set_sort(&mut self, value: Option<&Value>) -> Option<SortDirection> {
        self.sort = value.and_then(normalize_sort);
        self.sort
    }

    /// The accumulated filter, or `None` when empty. Callers treat an empty
    /// map and `None` as the same "no filter" signal.
    pub fn build_query(&self) -> Option<FilterMap> {
        (!self.filters.is_empty()).then(|| self.filters.clone())
    }

    pub fn build_sort_key_query(&self) -> Option<FilterMap> {
        (!self.sort_key.is_empty()).then(|| self.sort_key.clone())
    }

    pub fn props(&self) -> QueryProps {
        QueryProps {
            count: self.count,
            sort: self.sort,
        }
    }
}

fn normalize_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .filter(|n| *n > 0)
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok().filter(|n| *n > 0),
        _ => None,
    }
}

fn normalize_sort(value: &Value) -> Option<SortDirection> {
    match value {
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(SortDirection::Asc),
            Some(-1) => Some(SortDirection::Desc),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair(field: &str, value: Value) -> (String, Value) {
        (field.to_string(), value)
    }

    #[test]
    fn test_count_normalization() {
        let mut builder = QueryBuilder::new();

        assert_eq!(builder.set_count(Some(&json!(5))), Some(5));
        assert_eq!(builder.set_count(Some(&json!("5"))), Some(5));
        assert_eq!(builder.set_count(Some(&json!(" 12 "))), Some(12));

        for invalid in [json!(0), json!(-1), json!("abc"), json!(null), json!(2.5)] {
            builder.set_count(Some(&json!(3)));
            assert_eq!(builder.set_count(Some(&invalid)), None, "{invalid}");
            assert_eq!(builder.props().count, None);
        }

        builder.set_count(Some(&json!(3)));
        assert_eq!(builder.set_count(None), None);
    }

    #[test]
    fn test_sort_normalization() {
        let mut builder = QueryBuilder::new();

        for asc in [json!("asc"), json!("ascending"), json!("ASC"), json!(1)] {
            assert_eq!(builder.set_sort(Some(&asc)), Some(SortDirection::Asc));
        }
        for desc in [json!("desc"), json!("descending"), json!(-1)] {
            assert_eq!(builder.set_sort(Some(&desc)), Some(SortDirection::Desc));
        }
        for invalid in [json!("xyz"), json!(2), json!(null), json!(true)] {
            builder.set_sort(Some(&json!("asc")));
            assert_eq!(builder.set_sort(Some(&invalid)), None, "{invalid}");
        }
    }

    #[test]
    fn test_add_query_last_write_wins() {
        let mut builder = QueryBuilder::new();
        builder.add_query([pair("status", json!("open")), pair("kind", json!("sale"))]);
        builder.add_query([pair("status", json!("closed"))]);

        let query = builder.build_query().unwrap();
        assert_eq!(query.get("status"), Some(&json!("closed")));
        assert_eq!(query.get("kind"), Some(&json!("sale")));
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn test_sort_key_query_kept_separate() {
        let mut builder = QueryBuilder::new();
        builder.add_query([pair("status", json!("open"))]);
        builder.add_sort_key_query([pair(
            "between",
            json!(["2024-01-01", "2024-01-31"]),
        )]);

        assert_eq!(builder.build_query().unwrap().len(), 1);
        let range = builder.build_sort_key_query().unwrap();
        assert!(range.contains_key("between"));
    }

    #[test]
    fn test_empty_builds_are_none() {
        let builder = QueryBuilder::new();
        assert!(builder.build_query().is_none());
        assert!(builder.build_sort_key_query().is_none());
        assert_eq!(
            builder.props(),
            QueryProps {
                count: None,
                sort: None
            }
        );
    }

    #[test]
    fn test_build_returns_copies() {
        let mut builder = QueryBuilder::new();
        builder.add_query([pair("status", json!("open"))]);

        let mut copy = builder.build_query().unwrap();
        copy.insert("status".to_string(), json!("mutated"));
        assert_eq!(
            builder.build_query().unwrap().get("status"),
            Some(&json!("open"))
        );
    }
}
