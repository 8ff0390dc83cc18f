use super::{FailingEmbedder, VocabEmbedder};
use crate::dom::{NodeGraphBuilder, NodeId};
use crate::retriever::{
    ContextualRetriever, IndexStats, LexicalEmbedder, MatchType, RetrieverError,
    DEFAULT_THRESHOLD, DEFAULT_TOP_K,
};

const SHOP_PAGE: &str = r#"
<div backend_node_id="1">
    <h2 backend_node_id="2">Stay informed</h2>
    <button backend_node_id="3" class="primary" aria-label="Subscribe">Sign up for newsletter</button>
    <a backend_node_id="4" href="/" aria-label="Navigate to home page">Home</a>
    <div backend_node_id="5">
        <span backend_node_id="6">Product search</span>
        <input backend_node_id="7" type="text" placeholder="Search for products">
    </div>
    <button backend_node_id="8">Add to cart</button>
</div>
"#;

const LADDER_PAGE: &str = r#"
<div>
    <button backend_node_id="a">alpha</button>
    <button backend_node_id="b">alpha beta</button>
    <button backend_node_id="c">alpha beta gamma</button>
    <button backend_node_id="d">alpha beta gamma delta</button>
    <button backend_node_id="e">alpha beta gamma delta epsilon</button>
</div>
"#;

const VOCAB: &[&str] = &[
    "stay", "informed", "sign", "up", "for", "newsletter", "home", "product", "search", "add",
    "to", "cart", "weather", "forecast", "alpha", "beta", "gamma", "delta", "epsilon", "explode",
];

fn retriever() -> ContextualRetriever<VocabEmbedder> {
    ContextualRetriever::new(VocabEmbedder::new(VOCAB))
}

#[test]
fn test_index_reports_counts() {
    let mut rag = retriever();
    let stats = rag.index(SHOP_PAGE).unwrap();
    assert_eq!(
        stats,
        IndexStats {
            nodes: 8,
            interactive: 4
        }
    );
    assert_eq!(rag.indexed_count(), 4);
}

#[test]
fn test_matching_label_ranks_first_on_text() {
    let mut rag = retriever();
    rag.index(SHOP_PAGE).unwrap();

    let results = rag
        .query("Sign up for newsletter", DEFAULT_TOP_K, DEFAULT_THRESHOLD)
        .unwrap();

    assert!(!results.is_empty());
    assert_eq!(results[0].node.id, NodeId::from("3"));
    assert_eq!(results[0].node.tag, "button");
    assert_eq!(results[0].match_type, MatchType::Text);
    assert!((results[0].score - 1.0).abs() < 1e-6);
    assert!(results.iter().skip(1).all(|r| r.score < results[0].score));
}

#[test]
fn test_textless_input_found_through_context() {
    let mut rag = retriever();
    rag.index(SHOP_PAGE).unwrap();

    let hits = rag
        .hits("product search", DEFAULT_TOP_K, DEFAULT_THRESHOLD)
        .unwrap();

    let first = &hits[0];
    assert_eq!(first.node_id, NodeId::from("7"));
    assert_eq!(first.node_tag, "input");
    assert_eq!(first.node_text, "");
    assert_eq!(first.match_type, MatchType::Context);
    assert!((first.score - 4.0 / 6.0).abs() < 1e-5);
    assert_eq!(
        first.context,
        "Product search Stay informed Sign up for newsletter Home Product search Add to cart"
    );
}

#[test]
fn test_unrelated_query_returns_nothing() {
    let mut rag = retriever();
    rag.index(SHOP_PAGE).unwrap();

    let results = rag
        .query("weather forecast", DEFAULT_TOP_K, DEFAULT_THRESHOLD)
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_empty_query_scores_zero() {
    let mut rag = retriever();
    rag.index(SHOP_PAGE).unwrap();

    assert!(rag.query("   ", DEFAULT_TOP_K, DEFAULT_THRESHOLD).unwrap().is_empty());

    let all = rag.query("", 10, 0.0).unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|r| r.score == 0.0));
}

#[test]
fn test_top_k_keeps_best_results() {
    let mut rag = retriever();
    rag.index(LADDER_PAGE).unwrap();

    let all = rag.query("alpha", 10, DEFAULT_THRESHOLD).unwrap();
    assert_eq!(all.len(), 5);

    let results = rag.query("alpha", 2, DEFAULT_THRESHOLD).unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.node.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(results[0].score > results[1].score);
    assert!(results.iter().all(|r| r.match_type == MatchType::Text));
}

#[test]
fn test_equal_scores_ordered_by_id() {
    let mut rag = retriever();
    rag.index(
        r#"<button backend_node_id="z">alpha</button><button backend_node_id="m">alpha</button>"#,
    )
    .unwrap();

    let results = rag.query("alpha", 5, 0.5).unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.node.id.as_str()).collect();
    assert_eq!(ids, vec!["m", "z"]);
}

#[test]
fn test_reindex_replaces_previous_document() {
    let mut rag = retriever();
    rag.index(SHOP_PAGE).unwrap();
    rag.index(LADDER_PAGE).unwrap();

    assert!(rag.graph().get(&NodeId::from("3")).is_none());
    assert_eq!(rag.context_for_node(&NodeId::from("7")), "");
    assert!(rag
        .query("Sign up for newsletter", DEFAULT_TOP_K, DEFAULT_THRESHOLD)
        .unwrap()
        .is_empty());
}

#[test]
fn test_embedding_failure_keeps_previous_index() {
    let mut rag = ContextualRetriever::new(FailingEmbedder {
        inner: VocabEmbedder::new(VOCAB),
        trigger: "explode",
    });
    rag.index(SHOP_PAGE).unwrap();

    let result = rag.index(r#"<button backend_node_id="x">explode</button>"#);
    assert!(matches!(result, Err(RetrieverError::Embedding(_))));

    assert_eq!(rag.indexed_count(), 4);
    assert!(rag.graph().get(&NodeId::from("x")).is_none());
    let results = rag
        .query("Sign up for newsletter", DEFAULT_TOP_K, DEFAULT_THRESHOLD)
        .unwrap();
    assert_eq!(results[0].node.id, NodeId::from("3"));
}

#[test]
fn test_strict_parse_failure_surfaces() {
    let mut rag = retriever().with_builder(NodeGraphBuilder::default().strict(true));
    let result = rag.index(r#"<div backend_node_id="1"><button backend_node_id="2">Go</span></div>"#);
    assert!(matches!(result, Err(RetrieverError::Parse(_))));
}

#[test]
fn test_invalid_query_arguments() {
    let mut rag = retriever();
    rag.index(SHOP_PAGE).unwrap();

    assert!(matches!(
        rag.query("home", 0, DEFAULT_THRESHOLD),
        Err(RetrieverError::InvalidQuery(_))
    ));
    assert!(matches!(
        rag.query("home", 5, 1.5),
        Err(RetrieverError::InvalidQuery(_))
    ));
}

#[test]
fn test_query_before_indexing() {
    let rag = retriever();
    assert!(rag.query("home", 5, 0.0).unwrap().is_empty());
}

#[test]
fn test_context_depth_is_configurable() {
    let mut rag = retriever().with_context_depth(1);
    rag.index(SHOP_PAGE).unwrap();
    assert_eq!(rag.context_for_node(&NodeId::from("7")), "Product search");
}

#[test]
fn test_lexical_embedder_end_to_end() {
    let mut rag = ContextualRetriever::new(LexicalEmbedder::default());
    rag.index(SHOP_PAGE).unwrap();

    let results = rag
        .query("Sign up for newsletter", DEFAULT_TOP_K, DEFAULT_THRESHOLD)
        .unwrap();
    assert_eq!(results[0].node.id, NodeId::from("3"));
    assert_eq!(results[0].match_type, MatchType::Text);
    assert!((results[0].score - 1.0).abs() < 1e-5);
}
