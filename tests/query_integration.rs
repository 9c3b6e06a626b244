//! Integration tests for the query DSL
//!
//! Tests end-to-end search execution from JSON request bodies through to results.

use serde_json::json;
use termdex::{
    Document, IndexHandle, IndexMapping, QueryParser, SearchEngine, SearchResponse, TermdexError,
};

fn setup_test_index(engine: &SearchEngine) -> IndexHandle {
    let mapping = IndexMapping::from_json(&json!({
        "properties": {
            "name": { "type": "keyword", "required": true },
            "description": { "type": "text" }
        }
    }))
    .unwrap();
    let handle = engine.create_index("products", mapping).unwrap();

    let docs = [
        json!({ "id": 1, "name": "mouse", "description": "A wireless mouse" }),
        json!({ "id": 2, "name": "mouse pad", "description": "A pad for your mouse" }),
        json!({ "id": 3, "name": "keyboard", "description": "A mechanical keyboard" }),
        json!({ "id": 4, "name": "mouse", "description": "A gaming mouse with a mouse wheel" }),
    ]
    .iter()
    .map(|doc| Document::from_json(doc).unwrap())
    .collect();
    let response = engine.index_documents(&handle, docs).unwrap();
    assert_eq!(response.indexed_count(), 4);
    handle
}

fn search(engine: &SearchEngine, handle: &IndexHandle, body: serde_json::Value) -> SearchResponse {
    let request = QueryParser::parse_search_request(&body).unwrap();
    engine.search(handle, &request).unwrap()
}

#[test]
fn test_term_query() {
    let engine = SearchEngine::default();
    let handle = setup_test_index(&engine);

    let response = search(
        &engine,
        &handle,
        json!({ "query": { "term": { "name": "mouse" } }, "sort": [{ "_id": "asc" }] }),
    );
    assert_eq!(response.ids(), vec![1, 4]);
}

#[test]
fn test_terms_query() {
    let engine = SearchEngine::default();
    let handle = setup_test_index(&engine);

    let response = search(
        &engine,
        &handle,
        json!({ "query": { "terms": { "name": ["keyboard", "mouse pad"] } }, "sort": ["_id"] }),
    );
    assert_eq!(response.ids(), vec![2, 3]);
}

#[test]
fn test_match_query_or() {
    let engine = SearchEngine::default();
    let handle = setup_test_index(&engine);

    let response = search(
        &engine,
        &handle,
        json!({ "query": { "match": { "description": "mouse keyboard" } } }),
    );
    assert_eq!(response.total, 4);
    // Doc 4 mentions mouse twice
    assert_eq!(response.ids()[0], 4);
    assert_eq!(response.max_score, Some(2.0));
}

#[test]
fn test_match_query_and() {
    let engine = SearchEngine::default();
    let handle = setup_test_index(&engine);

    let response = search(
        &engine,
        &handle,
        json!({
            "query": {
                "match": { "description": { "query": "Mouse PAD", "operator": "and" } }
            }
        }),
    );
    assert_eq!(response.ids(), vec![2]);
}

#[test]
fn test_bool_query_with_all_clauses() {
    let engine = SearchEngine::default();
    let handle = setup_test_index(&engine);

    let response = search(
        &engine,
        &handle,
        json!({
            "query": {
                "bool": {
                    "must": [{ "match": { "description": "mouse" } }],
                    "filter": [{ "terms": { "name": ["mouse", "mouse pad"] } }],
                    "must_not": [{ "term": { "name": "mouse pad" } }],
                    "should": [{ "match": { "description": "wireless" } }]
                }
            },
            "sort": [{ "_id": { "order": "asc" } }]
        }),
    );
    assert_eq!(response.ids(), vec![1, 4]);
    // must (1) + should (1) for doc 1; must (2) for doc 4
    assert_eq!(response.hits[0].score, 2.0);
    assert_eq!(response.hits[1].score, 2.0);
}

#[test]
fn test_minimum_should_match() {
    let engine = SearchEngine::default();
    let handle = setup_test_index(&engine);

    let response = search(
        &engine,
        &handle,
        json!({
            "query": {
                "bool": {
                    "should": [
                        { "match": { "description": "mouse" } },
                        { "match": { "description": "pad" } },
                        { "match": { "description": "wireless" } }
                    ],
                    "minimum_should_match": 2
                }
            },
            "sort": ["_id"]
        }),
    );
    assert_eq!(response.ids(), vec![1, 2]);
}

#[test]
fn test_constant_score_and_match_all() {
    let engine = SearchEngine::default();
    let handle = setup_test_index(&engine);

    let response = search(
        &engine,
        &handle,
        json!({
            "query": {
                "constant_score": { "filter": { "term": { "name": "keyboard" } }, "boost": 3 }
            }
        }),
    );
    assert_eq!(response.ids(), vec![3]);
    assert_eq!(response.hits[0].score, 3.0);

    let all = search(&engine, &handle, json!({}));
    assert_eq!(all.total, 4);
    assert!(all.hits.iter().all(|hit| hit.score == 1.0));

    let none = search(&engine, &handle, json!({ "query": { "match_none": {} } }));
    assert_eq!(none.total, 0);
}

#[test]
fn test_request_with_aggregations_and_collapse() {
    let engine = SearchEngine::default();
    let handle = setup_test_index(&engine);

    let response = search(
        &engine,
        &handle,
        json!({
            "query": { "match_all": {} },
            "size": 10,
            "sort": [{ "_id": "desc" }],
            "collapse": { "field": "name" },
            "aggs": {
                "names": {
                    "terms": { "field": "name" },
                    "aggs": { "latest": { "top_hits": { "size": 1, "sort": [{ "_id": "desc" }] } } }
                },
                "distinct": { "cardinality": { "field": "name" } },
                "matrix": {
                    "adjacency_matrix": {
                        "filters": {
                            "mouse": { "term": { "name": "mouse" } },
                            "described": { "match": { "description": "mouse" } }
                        }
                    }
                }
            }
        }),
    );

    assert_eq!(response.ids(), vec![4, 3, 2]);
    assert_eq!(response.aggregation("distinct").unwrap().value(), Some(3));

    let names = response.aggregation("names").unwrap();
    assert_eq!(names.bucket("mouse").unwrap().doc_count, 2);
    let latest = names.bucket("mouse").unwrap().sub_aggregation("latest").unwrap();
    assert_eq!(latest.hits().unwrap()[0].id, 4);

    let matrix = response.aggregation("matrix").unwrap();
    assert_eq!(matrix.bucket("described").unwrap().doc_count, 3);
    assert_eq!(matrix.bucket("described&mouse").unwrap().doc_count, 2);
    assert_eq!(matrix.bucket("mouse").unwrap().doc_count, 2);
}

#[test]
fn test_response_serializes_like_search_api() {
    let engine = SearchEngine::default();
    let handle = setup_test_index(&engine);

    let response = search(
        &engine,
        &handle,
        json!({
            "query": { "term": { "name": "keyboard" } },
            "aggs": { "distinct": { "cardinality": { "field": "name" } } }
        }),
    );
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["total"], 1);
    assert_eq!(value["hits"][0]["_id"], 3);
    assert_eq!(value["hits"][0]["_source"]["name"], "keyboard");
    assert_eq!(value["aggregations"]["distinct"]["value"], 1);
}

#[test]
fn test_invalid_requests() {
    let bodies = [
        json!({ "query": { "fuzzy": { "name": "mouse" } } }),
        json!({ "query": { "term": { "name": "a" }, "match": { "name": "b" } } }),
        json!({ "query": { "bool": { "shoud": [] } } }),
        json!({ "highlight": {} }),
        json!({ "sort": [{ "name": "sideways" }] }),
        json!({ "aggs": { "x": { "cardinality": { "field": "name" }, "aggs": {} } } }),
        json!({ "aggs": { "x": { "histogram": { "field": "name" } } } }),
    ];
    for body in bodies {
        assert!(
            matches!(
                QueryParser::parse_search_request(&body),
                Err(TermdexError::InvalidRequest(_))
            ),
            "body: {}",
            body
        );
    }
}

#[test]
fn test_unknown_field_in_query() {
    let engine = SearchEngine::default();
    let handle = setup_test_index(&engine);

    let request =
        QueryParser::parse_search_request(&json!({ "query": { "term": { "color": "red" } } })).unwrap();
    assert!(matches!(
        engine.search(&handle, &request),
        Err(TermdexError::UnknownField(_))
    ));

    let request =
        QueryParser::parse_search_request(&json!({ "sort": [{ "description": "asc" }] })).unwrap();
    assert!(matches!(
        engine.search(&handle, &request),
        Err(TermdexError::InvalidRequest(_))
    ));
}

#[test]
fn test_result_window_limit() {
    let engine = SearchEngine::default();
    let handle = setup_test_index(&engine);

    let request = QueryParser::parse_search_request(&json!({ "from": 9_995, "size": 10 })).unwrap();
    assert!(matches!(
        engine.search(&handle, &request),
        Err(TermdexError::InvalidRequest(_))
    ));
}
