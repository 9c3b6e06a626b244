//! Golden tests for keyword and text field searching, sorting and scripting
//!
//! Fixtures are small product catalogues whose expected results are fixed.

use termdex::{
    BoolQuery, ConstantScoreQuery, Document, FieldMapping, IndexHandle, IndexMapping,
    MatchAllQuery, MatchQuery, Script, ScriptSortType, ScriptValue, SearchEngine, SearchRequest,
    SearchResponse, SortCriterion, SortOrder, TermQuery, TermsQuery,
};

fn keyword_index(engine: &SearchEngine, names: &[(u64, &str)]) -> IndexHandle {
    let handle = engine
        .create_index("products", IndexMapping::new().field(FieldMapping::keyword("name")))
        .unwrap();
    let docs = names
        .iter()
        .map(|(id, name)| Document::new(*id).field("name", *name))
        .collect();
    let response = engine.index_documents(&handle, docs).unwrap();
    assert!(!response.errors);
    handle
}

fn mouse_catalogue(engine: &SearchEngine) -> IndexHandle {
    keyword_index(engine, &[(1, "mouse"), (2, "mouse pad")])
}

fn names(response: &SearchResponse) -> String {
    response
        .hits
        .iter()
        .filter_map(|hit| hit.source.first_value("name"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[test]
fn golden_keyword_term_query_matches_exact_value() {
    let engine = SearchEngine::default();
    let handle = mouse_catalogue(&engine);

    for name in ["mouse", "mouse pad"] {
        let response = engine
            .search(&handle, &SearchRequest::new(TermQuery::new("name", name)))
            .unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(names(&response), name);
    }
}

#[test]
fn golden_keyword_bool_filter_matches_exact_value() {
    let engine = SearchEngine::default();
    let handle = mouse_catalogue(&engine);

    for name in ["mouse", "mouse pad"] {
        let query = BoolQuery::new().filter(TermQuery::new("name", name));
        let response = engine.search(&handle, &SearchRequest::new(query)).unwrap();
        assert_eq!(names(&response), name);
        // Filters do not contribute to the score
        assert_eq!(response.hits[0].score, 0.0);
    }
}

#[test]
fn golden_keyword_constant_score() {
    let engine = SearchEngine::default();
    let handle = mouse_catalogue(&engine);

    for name in ["mouse", "mouse pad"] {
        let query = ConstantScoreQuery::new(TermQuery::new("name", name)).with_boost(3.0);
        let response = engine.search(&handle, &SearchRequest::new(query)).unwrap();
        assert_eq!(names(&response), name);
        assert_eq!(response.hits[0].score, 3.0);
        assert_eq!(response.max_score, Some(3.0));
    }
}

#[test]
fn golden_keyword_match_has_no_query_time_analysis() {
    let engine = SearchEngine::default();
    let handle = mouse_catalogue(&engine);

    for name in ["mouse", "mouse pad"] {
        let response = engine
            .search(&handle, &SearchRequest::new(MatchQuery::new("name", name)))
            .unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(names(&response), name);
    }

    // The standard analyzer would have split the value
    let tokens = engine.analyze(&handle, "standard", "mouse pad").unwrap();
    let terms: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(terms, vec!["mouse", "pad"]);
}

#[test]
fn golden_keyword_match_requires_exact_value() {
    let engine = SearchEngine::default();
    let handle = mouse_catalogue(&engine);

    for query in ["mous", "mousepad", "Mouse pad"] {
        let response = engine
            .search(&handle, &SearchRequest::new(MatchQuery::new("name", query)))
            .unwrap();
        assert!(response.hits.is_empty(), "query: {}", query);
        assert_eq!(response.total, 0);
        assert_eq!(response.max_score, None);
    }
}

#[test]
fn golden_keyword_script_sort() {
    let engine = SearchEngine::default();
    let handle = mouse_catalogue(&engine);

    let script = Script::new(|doc| {
        if doc.first_value("name") == Some("mouse pad") {
            ScriptValue::from(0i64)
        } else {
            ScriptValue::from(1i64)
        }
    });
    let request = SearchRequest::new(MatchAllQuery::new()).sort(SortCriterion::script(
        script,
        ScriptSortType::Number,
        SortOrder::Asc,
    ));

    let response = engine.search(&handle, &request).unwrap();
    assert_eq!(names(&response), "mouse pad, mouse");
}

#[test]
fn golden_keyword_field_sort_descending() {
    let engine = SearchEngine::default();
    let handle = mouse_catalogue(&engine);

    let request = SearchRequest::new(MatchAllQuery::new())
        .explain(true)
        .sort(SortCriterion::field("name", SortOrder::Desc));
    let response = engine.search(&handle, &request).unwrap();
    assert_eq!(names(&response), "mouse pad, mouse");
    assert!(response.hits.iter().all(|hit| hit.explanation.is_some()));
}

#[test]
fn golden_keyword_sort_is_lexicographic() {
    let engine = SearchEngine::default();
    let handle = keyword_index(&engine, &[(1, "5"), (2, "2000")]);

    let request = SearchRequest::new(MatchAllQuery::new()).sort(SortCriterion::field("name", SortOrder::Desc));
    let response = engine.search(&handle, &request).unwrap();
    assert_eq!(names(&response), "5, 2000");
}

#[test]
fn golden_keyword_script_fields() {
    let engine = SearchEngine::default();
    let handle = mouse_catalogue(&engine);

    for matched_name in ["mouse", "mouse pad"] {
        let expected_name = matched_name.to_string();
        let script = Script::new(move |doc| {
            if doc.first_value("name") == Some(expected_name.as_str()) {
                ScriptValue::from("computer accessory")
            } else {
                ScriptValue::from("mouse accessory")
            }
        });
        let request = SearchRequest::new(MatchAllQuery::new())
            .sort(SortCriterion::id(SortOrder::Asc))
            .script_field("category", script);
        let response = engine.search(&handle, &request).unwrap();

        let formatted: Vec<String> = response
            .hits
            .iter()
            .map(|hit| {
                // Script fields live beside the source, never inside it
                assert!(hit.source.get("category").is_none());
                let category: String = hit.fields.get("category").unwrap().unwrap();
                format!("{}:{}", hit.source.first_value("name").unwrap(), category)
            })
            .collect();

        let expected = if matched_name == "mouse" {
            "mouse:computer accessory, mouse pad:mouse accessory"
        } else {
            "mouse:mouse accessory, mouse pad:computer accessory"
        };
        assert_eq!(formatted.join(", "), expected);
    }
}

#[test]
fn golden_text_term_query_needs_analyzed_term() {
    let engine = SearchEngine::default();
    let handle = engine
        .create_index("products", IndexMapping::new().field(FieldMapping::text("description")))
        .unwrap();
    engine
        .index_documents(&handle, vec![Document::new(1).field("description", "Mouse pad")])
        .unwrap();

    let search = |query: TermQuery| engine.search(&handle, &SearchRequest::new(query)).unwrap().total;

    // Stored terms are lowercase single words
    assert_eq!(search(TermQuery::new("description", "mouse")), 1);
    assert_eq!(search(TermQuery::new("description", "pad")), 1);
    assert_eq!(search(TermQuery::new("description", "Mouse")), 0);
    assert_eq!(search(TermQuery::new("description", "mouse pad")), 0);
}

#[test]
fn golden_text_match_query_ranks_by_term_frequency() {
    let engine = SearchEngine::default();
    let handle = engine
        .create_index(
            "products",
            IndexMapping::new()
                .field(FieldMapping::keyword("name"))
                .field(FieldMapping::text("description")),
        )
        .unwrap();
    engine
        .index_documents(
            &handle,
            vec![
                Document::new(1).field("name", "pad").field("description", "A soft pad"),
                Document::new(2).field("name", "mouse").field("description", "A mouse, a great mouse"),
                Document::new(3).field("name", "mouse pad").field("description", "Mouse pad for any mouse"),
                Document::new(4).field("name", "keyboard").field("description", "A keyboard"),
            ],
        )
        .unwrap();

    let response = engine
        .search(&handle, &SearchRequest::new(MatchQuery::new("description", "Mouse PAD")))
        .unwrap();
    assert_eq!(response.total, 3);
    // doc 3 holds mouse twice and pad once; doc 2 mouse twice; doc 1 pad once
    assert_eq!(response.ids(), vec![3, 2, 1]);
    assert_eq!(response.hits[0].score, 3.0);
    assert_eq!(response.max_score, Some(3.0));

    let and_response = engine
        .search(
            &handle,
            &SearchRequest::new(MatchQuery::new("description", "mouse pad").with_and_operator()),
        )
        .unwrap();
    assert_eq!(and_response.ids(), vec![3]);
}

#[test]
fn golden_bool_query_combines_clauses() {
    let engine = SearchEngine::default();
    let handle = keyword_index(
        &engine,
        &[(1, "mouse"), (2, "mouse pad"), (3, "keyboard"), (4, "mouse")],
    );

    let query = BoolQuery::new()
        .should(TermQuery::new("name", "mouse"))
        .should(TermQuery::new("name", "keyboard"))
        .must_not(TermsQuery::new("name", ["keyboard"]));
    let response = engine
        .search(&handle, &SearchRequest::new(query).sort(SortCriterion::id(SortOrder::Asc)))
        .unwrap();
    assert_eq!(response.ids(), vec![1, 4]);
}

#[test]
fn golden_pagination_after_sorting() {
    let engine = SearchEngine::default();
    let handle = keyword_index(
        &engine,
        &[(1, "a"), (2, "b"), (3, "c"), (4, "d"), (5, "e")],
    );

    let request = SearchRequest::new(MatchAllQuery::new())
        .sort(SortCriterion::field("name", SortOrder::Desc))
        .from(1)
        .size(2);
    let response = engine.search(&handle, &request).unwrap();
    assert_eq!(response.total, 5);
    assert_eq!(names(&response), "d, c");

    let empty = engine
        .search(&handle, &SearchRequest::new(MatchAllQuery::new()).from(10).size(5))
        .unwrap();
    assert!(empty.hits.is_empty());
    assert_eq!(empty.total, 5);
}
