//! Query DSL parser
//!
//! Parses JSON query DSL into query AST nodes, and whole search request
//! bodies into [`SearchRequest`]s. The syntax is a subset of the
//! Elasticsearch Query DSL.

use crate::aggregations::{
    AdjacencyMatrixAggregation, Aggregation, Aggregations, CardinalityAggregation, TermsAggregation,
    TopHitsAggregation,
};
use crate::error::TermdexError;
use crate::models::SearchRequest;
use crate::query::ast::{MatchAllQuery, MatchNoneQuery, QueryNode};
use crate::query::nodes::{BoolQuery, ConstantScoreQuery, MatchQuery, TermQuery, TermsQuery};
use crate::query::types::{MatchOperator, MinimumShouldMatch};
use crate::sort::{SortCriterion, SortOrder};
use crate::Result;
use serde_json::{Map, Value};

fn invalid(message: impl Into<String>) -> TermdexError {
    TermdexError::InvalidRequest(message.into())
}

/// Query parser for JSON DSL
pub struct QueryParser;

impl QueryParser {
    /// Parse a JSON query into an AST node
    ///
    /// # Example
    ///
    /// ```json
    /// {
    ///   "bool": {
    ///     "must": [
    ///       { "match": { "description": "mouse" } }
    ///     ],
    ///     "filter": [
    ///       { "term": { "name": "mouse" } }
    ///     ]
    ///   }
    /// }
    /// ```
    pub fn parse(json: &Value) -> Result<Box<dyn QueryNode>> {
        match json {
            Value::Object(map) => Self::parse_query_object(map),
            _ => Err(invalid("Query must be a JSON object")),
        }
    }

    /// Parse a JSON string into an AST node
    pub fn parse_str(json_str: &str) -> Result<Box<dyn QueryNode>> {
        let value: Value = serde_json::from_str(json_str)
            .map_err(|e| invalid(format!("Invalid JSON: {}", e)))?;
        Self::parse(&value)
    }

    fn parse_query_object(map: &Map<String, Value>) -> Result<Box<dyn QueryNode>> {
        // Handle wrapped query: { "query": { ... } }
        if let Some(query) = map.get("query") {
            return Self::parse(query);
        }

        let (kind, body) = match map.iter().next() {
            Some(entry) if map.len() == 1 => entry,
            _ => {
                return Err(invalid(format!(
                    "A query object must have exactly one key, got: {:?}",
                    map.keys().collect::<Vec<_>>()
                )))
            }
        };

        match kind.as_str() {
            "bool" => Self::parse_bool(body),
            "match" => Self::parse_match(body),
            "match_all" => Ok(Box::new(MatchAllQuery::new().with_boost(Self::boost_of(body)?))),
            "match_none" => Ok(Box::new(MatchNoneQuery)),
            "term" => Self::parse_term(body),
            "terms" => Self::parse_terms(body),
            "constant_score" => Self::parse_constant_score(body),
            other => Err(invalid(format!(
                "Unknown query type '{}'. Expected one of: bool, constant_score, match, match_all, match_none, term, terms",
                other
            ))),
        }
    }

    /// Parse a bool query
    fn parse_bool(value: &Value) -> Result<Box<dyn QueryNode>> {
        let map = value
            .as_object()
            .ok_or_else(|| invalid("bool query must be an object"))?;

        let mut query = BoolQuery::new();
        for (key, clause) in map {
            match key.as_str() {
                "must" => query.must = Self::parse_clause_array(clause)?,
                "should" => query.should = Self::parse_clause_array(clause)?,
                "must_not" => query.must_not = Self::parse_clause_array(clause)?,
                "filter" => query.filter = Self::parse_clause_array(clause)?,
                "minimum_should_match" => {
                    query.minimum_should_match = Some(Self::parse_minimum_should_match(clause)?)
                }
                "boost" => query.boost = Self::parse_boost(clause)?,
                other => return Err(invalid(format!("Unknown bool clause '{}'", other))),
            }
        }

        Ok(Box::new(query))
    }

    /// Parse an array of query clauses
    fn parse_clause_array(value: &Value) -> Result<Vec<Box<dyn QueryNode>>> {
        match value {
            Value::Array(arr) => arr.iter().map(Self::parse).collect(),
            // Single clause can be provided without array wrapper
            obj @ Value::Object(_) => Ok(vec![Self::parse(obj)?]),
            _ => Err(invalid("Clause must be an array or object")),
        }
    }

    /// Parse minimum_should_match
    fn parse_minimum_should_match(value: &Value) -> Result<MinimumShouldMatch> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .map(|n| MinimumShouldMatch::Count(n as usize))
                .ok_or_else(|| invalid(format!("Invalid minimum_should_match: {}", n))),
            Value::String(s) if s.ends_with('%') => Ok(MinimumShouldMatch::Percentage(s.clone())),
            Value::String(s) => s
                .parse()
                .map(MinimumShouldMatch::Count)
                .map_err(|_| invalid(format!("Invalid minimum_should_match: {}", s))),
            _ => Err(invalid("minimum_should_match must be a number or string")),
        }
    }

    fn parse_boost(value: &Value) -> Result<f32> {
        value
            .as_f64()
            .map(|b| b as f32)
            .ok_or_else(|| invalid(format!("boost must be a number, got {}", value)))
    }

    /// Optional `boost` of an object body
    fn boost_of(value: &Value) -> Result<f32> {
        match value.get("boost") {
            Some(boost) => Self::parse_boost(boost),
            None => Ok(1.0),
        }
    }

    /// The single `{ "field": spec }` entry of a field-level query
    fn field_entry<'v>(value: &'v Value, kind: &str) -> Result<(&'v String, &'v Value)> {
        let map = value
            .as_object()
            .ok_or_else(|| invalid(format!("{} query must be an object", kind)))?;
        map.iter()
            .find(|(k, _)| *k != "boost")
            .ok_or_else(|| invalid(format!("{} query must specify a field", kind)))
    }

    /// Parse a match query
    fn parse_match(value: &Value) -> Result<Box<dyn QueryNode>> {
        // { "field": "text" } or { "field": { "query": "text", ... } }
        let (field, spec) = Self::field_entry(value, "match")?;

        let query = match spec {
            Value::Object(spec) => {
                let text = spec
                    .get("query")
                    .and_then(scalar_string)
                    .ok_or_else(|| invalid("match query spec must have 'query' field"))?;

                let mut q = MatchQuery::new(field.clone(), text);
                if let Some(op) = spec.get("operator") {
                    q.operator = match op.as_str().map(str::to_lowercase).as_deref() {
                        Some("and") => MatchOperator::And,
                        Some("or") => MatchOperator::Or,
                        _ => return Err(invalid(format!("Invalid match operator: {}", op))),
                    };
                }
                if let Some(boost) = spec.get("boost") {
                    q.boost = Self::parse_boost(boost)?;
                }
                if let Some(analyzer) = spec.get("analyzer") {
                    q.analyzer = analyzer.as_str().map(String::from);
                }
                q
            }
            other => {
                let text = scalar_string(other)
                    .ok_or_else(|| invalid("match query value must be a string or object"))?;
                MatchQuery::new(field.clone(), text)
            }
        };

        Ok(Box::new(query))
    }

    /// Parse a term query
    fn parse_term(value: &Value) -> Result<Box<dyn QueryNode>> {
        // { "field": "value" } or { "field": { "value": "...", "boost": 2 } }
        let (field, spec) = Self::field_entry(value, "term")?;

        let (term, boost) = match spec {
            Value::Object(spec) => {
                let term = spec
                    .get("value")
                    .and_then(scalar_string)
                    .ok_or_else(|| invalid("term query spec must have 'value' field"))?;
                let boost = match spec.get("boost") {
                    Some(boost) => Self::parse_boost(boost)?,
                    None => 1.0,
                };
                (term, boost)
            }
            other => {
                let term = scalar_string(other).ok_or_else(|| {
                    invalid("term query value must be a string, number, boolean, or object")
                })?;
                (term, 1.0)
            }
        };

        Ok(Box::new(TermQuery::new(field.clone(), term).with_boost(boost)))
    }

    /// Parse a terms query
    fn parse_terms(value: &Value) -> Result<Box<dyn QueryNode>> {
        // { "field": ["value1", "value2", ...], "boost": 1.0 }
        let (field, spec) = Self::field_entry(value, "terms")?;

        let terms = spec
            .as_array()
            .ok_or_else(|| invalid("terms query value must be an array"))?
            .iter()
            .map(|v| scalar_string(v).ok_or_else(|| invalid(format!("Invalid term: {}", v))))
            .collect::<Result<Vec<_>>>()?;

        Ok(Box::new(
            TermsQuery::new(field.clone(), terms).with_boost(Self::boost_of(value)?),
        ))
    }

    /// Parse a constant_score query
    fn parse_constant_score(value: &Value) -> Result<Box<dyn QueryNode>> {
        let filter = value
            .get("filter")
            .ok_or_else(|| invalid("constant_score query must have a 'filter'"))?;

        Ok(Box::new(
            ConstantScoreQuery::from_boxed(Self::parse(filter)?).with_boost(Self::boost_of(value)?),
        ))
    }

    /// Parse a search request body
    ///
    /// Accepts `query`, `size`, `from`, `explain`, `sort`, `aggs` (or
    /// `aggregations`) and `collapse`. A missing query matches everything.
    pub fn parse_search_request(json: &Value) -> Result<SearchRequest> {
        let map = json
            .as_object()
            .ok_or_else(|| invalid("Search request must be a JSON object"))?;

        let mut request = match map.get("query") {
            Some(query) => SearchRequest::from_boxed(Self::parse(query)?),
            None => SearchRequest::default(),
        };

        for (key, value) in map {
            match key.as_str() {
                "query" => {}
                "size" => request.size = Some(Self::parse_usize(value, "size")?),
                "from" => request.from = Self::parse_usize(value, "from")?,
                "explain" => {
                    request.explain = value
                        .as_bool()
                        .ok_or_else(|| invalid("explain must be a boolean"))?
                }
                "sort" => request.sort = Self::parse_sort(value)?,
                "aggs" | "aggregations" => request.aggregations = Self::parse_aggregations(value)?,
                "collapse" => {
                    let field = value
                        .get("field")
                        .and_then(Value::as_str)
                        .ok_or_else(|| invalid("collapse must name a 'field'"))?;
                    request.collapse = Some(field.to_string());
                }
                other => return Err(invalid(format!("Unknown search request key '{}'", other))),
            }
        }

        Ok(request)
    }

    fn parse_usize(value: &Value, name: &str) -> Result<usize> {
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| invalid(format!("{} must be a non-negative integer", name)))
    }

    /// Parse sort criteria
    ///
    /// Each entry is `"field"`, `{ "field": "desc" }` or
    /// `{ "field": { "order": "desc" } }`. `_score` and `_id` are accepted.
    pub fn parse_sort(value: &Value) -> Result<Vec<SortCriterion>> {
        let entries = match value {
            Value::Array(entries) => entries.iter().collect(),
            single => vec![single],
        };

        entries
            .into_iter()
            .map(|entry| match entry {
                Value::String(field) => Ok(Self::sort_criterion(field, None)),
                Value::Object(map) if map.len() == 1 => {
                    let (field, spec) = map
                        .iter()
                        .next()
                        .ok_or_else(|| invalid("Empty sort entry"))?;
                    let order = match spec {
                        Value::String(order) => Self::parse_order(order)?,
                        Value::Object(spec) => match spec.get("order").and_then(Value::as_str) {
                            Some(order) => Self::parse_order(order)?,
                            None => return Ok(Self::sort_criterion(field, None)),
                        },
                        _ => return Err(invalid(format!("Invalid sort entry: {}", entry))),
                    };
                    Ok(Self::sort_criterion(field, Some(order)))
                }
                _ => Err(invalid(format!("Invalid sort entry: {}", entry))),
            })
            .collect()
    }

    fn sort_criterion(field: &str, order: Option<SortOrder>) -> SortCriterion {
        match field {
            "_score" => SortCriterion::Score {
                order: order.unwrap_or(SortOrder::Desc),
            },
            "_id" => SortCriterion::id(order.unwrap_or_default()),
            field => SortCriterion::field(field, order.unwrap_or_default()),
        }
    }

    fn parse_order(order: &str) -> Result<SortOrder> {
        match order.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(invalid(format!("Invalid sort order '{}'", order))),
        }
    }

    /// Parse a map of named aggregations
    pub fn parse_aggregations(value: &Value) -> Result<Aggregations> {
        let map = value
            .as_object()
            .ok_or_else(|| invalid("aggregations must be an object"))?;

        map.iter()
            .map(|(name, spec)| Ok((name.clone(), Self::parse_aggregation(name, spec)?)))
            .collect()
    }

    fn parse_aggregation(name: &str, value: &Value) -> Result<Aggregation> {
        let map = value
            .as_object()
            .ok_or_else(|| invalid(format!("aggregation '{}' must be an object", name)))?;

        let sub_aggregations = match map.get("aggs").or_else(|| map.get("aggregations")) {
            Some(subs) => Some(Self::parse_aggregations(subs)?),
            None => None,
        };

        let mut kinds = map
            .iter()
            .filter(|(k, _)| *k != "aggs" && *k != "aggregations");
        let (kind, body) = match (kinds.next(), kinds.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(invalid(format!(
                    "aggregation '{}' must have exactly one type",
                    name
                )))
            }
        };

        let field = || {
            body.get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(format!("{} aggregation '{}' must name a 'field'", kind, name)))
        };

        let aggregation: Aggregation = match kind.as_str() {
            "terms" => {
                let mut agg = TermsAggregation::new(field()?);
                if let Some(size) = body.get("size") {
                    agg.size = Self::parse_usize(size, "size")?;
                }
                agg.sub_aggregations = sub_aggregations.clone().unwrap_or_default();
                agg.into()
            }
            "cardinality" => CardinalityAggregation::new(field()?).into(),
            "top_hits" => {
                let mut agg = TopHitsAggregation::new();
                if let Some(size) = body.get("size") {
                    agg.size = Self::parse_usize(size, "size")?;
                }
                if let Some(sort) = body.get("sort") {
                    agg.sort = Self::parse_sort(sort)?;
                }
                agg.into()
            }
            "adjacency_matrix" => {
                let mut agg = AdjacencyMatrixAggregation::new();
                let filters = body
                    .get("filters")
                    .and_then(Value::as_object)
                    .ok_or_else(|| invalid("adjacency_matrix must have a 'filters' object"))?;
                for (filter_name, filter) in filters {
                    agg = agg.filter_boxed(filter_name.clone(), Self::parse(filter)?);
                }
                if let Some(separator) = body.get("separator").and_then(Value::as_str) {
                    agg.separator = separator.to_string();
                }
                agg.into()
            }
            other => return Err(invalid(format!("Unknown aggregation type '{}'", other))),
        };

        if sub_aggregations.is_some() && !matches!(aggregation, Aggregation::Terms(_)) {
            return Err(invalid(format!(
                "{} aggregation '{}' does not take sub-aggregations",
                aggregation.kind(),
                name
            )));
        }
        Ok(aggregation)
    }
}

/// JSON scalars as term text
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_term_query() {
        let query = QueryParser::parse(&json!({ "term": { "name": "mouse" } })).unwrap();
        assert_eq!(query.query_type(), "term");

        let query = QueryParser::parse(&json!({ "term": { "name": { "value": 5, "boost": 2.0 } } })).unwrap();
        assert_eq!(query.boost(), 2.0);
    }

    #[test]
    fn test_parse_match_query() {
        let query = QueryParser::parse(&json!({ "match": { "description": "mouse pad" } })).unwrap();
        assert_eq!(query.query_type(), "match");

        let query = QueryParser::parse(&json!({
            "match": { "description": { "query": "mouse pad", "operator": "and" } }
        }))
        .unwrap();
        assert_eq!(query.query_type(), "match");

        assert!(QueryParser::parse(&json!({
            "match": { "description": { "query": "x", "operator": "xor" } }
        }))
        .is_err());
    }

    #[test]
    fn test_parse_bool_query() {
        let query = QueryParser::parse(&json!({
            "bool": {
                "must": [{ "match": { "description": "mouse" } }],
                "filter": { "term": { "name": "mouse" } },
                "must_not": [{ "term": { "name": "keyboard" } }],
                "minimum_should_match": "50%",
                "boost": 2
            }
        }))
        .unwrap();
        assert_eq!(query.query_type(), "bool");
        assert_eq!(query.boost(), 2.0);
    }

    #[test]
    fn test_parse_constant_score() {
        let query = QueryParser::parse(&json!({
            "constant_score": { "filter": { "term": { "name": "mouse" } }, "boost": 3 }
        }))
        .unwrap();
        assert_eq!(query.query_type(), "constant_score");
        assert_eq!(query.boost(), 3.0);

        assert!(QueryParser::parse(&json!({ "constant_score": { "boost": 3 } })).is_err());
    }

    #[test]
    fn test_parse_match_all_and_none() {
        assert_eq!(QueryParser::parse(&json!({ "match_all": {} })).unwrap().query_type(), "match_all");
        assert_eq!(QueryParser::parse(&json!({ "match_none": {} })).unwrap().query_type(), "match_none");
        assert_eq!(
            QueryParser::parse_str(r#"{"query": {"terms": {"name": ["a", "b"]}}}"#)
                .unwrap()
                .query_type(),
            "terms"
        );
    }

    #[test]
    fn test_unknown_query_type() {
        let err = QueryParser::parse(&json!({ "fuzzy": { "name": "mose" } })).unwrap_err();
        assert!(matches!(err, TermdexError::InvalidRequest(_)));
        assert!(QueryParser::parse(&json!("mouse")).is_err());
    }

    #[test]
    fn test_parse_sort() {
        let sort = QueryParser::parse_sort(&json!([
            "name",
            { "_id": "desc" },
            { "_score": {} },
            { "tags": { "order": "desc" } }
        ]))
        .unwrap();

        assert!(matches!(&sort[0], SortCriterion::Field { field, order: SortOrder::Asc } if field == "name"));
        assert!(matches!(sort[1], SortCriterion::Id { order: SortOrder::Desc }));
        assert!(matches!(sort[2], SortCriterion::Score { order: SortOrder::Desc }));
        assert_eq!(sort[3].order(), SortOrder::Desc);

        assert!(QueryParser::parse_sort(&json!({ "name": "sideways" })).is_err());
    }

    #[test]
    fn test_parse_search_request() {
        let request = QueryParser::parse_search_request(&json!({
            "query": { "match": { "description": "mouse" } },
            "size": 2,
            "from": 1,
            "explain": true,
            "sort": [{ "name": "desc" }],
            "collapse": { "field": "name" },
            "aggs": {
                "names": {
                    "terms": { "field": "name", "size": 5 },
                    "aggs": { "latest": { "top_hits": { "size": 1, "sort": [{ "_id": "desc" }] } } }
                },
                "distinct": { "cardinality": { "field": "name" } },
                "matrix": {
                    "adjacency_matrix": {
                        "filters": {
                            "mouse": { "terms": { "products": ["mouse"] } },
                            "keyboard": { "terms": { "products": ["keyboard"] } }
                        }
                    }
                }
            }
        }))
        .unwrap();

        assert_eq!(request.size, Some(2));
        assert_eq!(request.from, 1);
        assert!(request.explain);
        assert_eq!(request.collapse.as_deref(), Some("name"));
        assert_eq!(request.sort.len(), 1);
        assert_eq!(request.aggregations.len(), 3);
        match &request.aggregations["names"] {
            Aggregation::Terms(terms) => {
                assert_eq!(terms.size, 5);
                assert!(matches!(terms.sub_aggregations["latest"], Aggregation::TopHits(_)));
            }
            other => panic!("unexpected aggregation {:?}", other),
        }
        match &request.aggregations["matrix"] {
            Aggregation::AdjacencyMatrix(matrix) => assert_eq!(matrix.filters.len(), 2),
            other => panic!("unexpected aggregation {:?}", other),
        }
    }

    #[test]
    fn test_parse_search_request_defaults() {
        let request = QueryParser::parse_search_request(&json!({})).unwrap();
        assert_eq!(request.query.query_type(), "match_all");
        assert_eq!(request.size, None);

        assert!(QueryParser::parse_search_request(&json!({ "highlight": {} })).is_err());
        assert!(QueryParser::parse_search_request(&json!({
            "aggs": { "bad": { "cardinality": { "field": "name" }, "aggs": {} } }
        }))
        .is_err());
    }
}
