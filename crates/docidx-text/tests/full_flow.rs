use std::sync::Arc;

use docidx_core::config::Bm25Settings;
use docidx_core::{Document, Error, Query, SearchIndex};
use docidx_text::Bm25Index;

fn pets_index() -> (Bm25Index, Vec<Arc<Document>>) {
    let docs: Vec<Arc<Document>> = ["the cat sat on the mat", "dogs bark loudly", "cats and dogs are pets"]
        .into_iter()
        .map(|c| Arc::new(Document::new(c)))
        .collect();
    let mut index = Bm25Index::new();
    index.add_documents(&docs).expect("add");
    (index, docs)
}

#[test]
fn cat_query_excludes_documents_without_overlap() {
    let (index, docs) = pets_index();
    let hits = index.search(Query::Text("cat"), 10).expect("search");
    assert_eq!(hits.len(), 1, "only the first document contains the token 'cat'");
    assert!(Arc::ptr_eq(&hits[0].document, &docs[0]));
    assert!(hits.iter().all(|h| !Arc::ptr_eq(&h.document, &docs[1])));
}

#[test]
fn multi_term_query_orders_by_relevance() {
    let (index, docs) = pets_index();
    // "cat" is rare (only doc 0), "dogs" appears in docs 1 and 2; doc 1 is shorter than doc 2.
    let hits = index.search(Query::Text("cat dogs"), 10).expect("search");
    assert_eq!(hits.len(), 3);
    assert!(Arc::ptr_eq(&hits[0].document, &docs[0]));
    assert!(Arc::ptr_eq(&hits[1].document, &docs[1]));
    assert!(Arc::ptr_eq(&hits[2].document, &docs[2]));
    assert!(hits.windows(2).all(|w| w[0].score < w[1].score), "normalized scores ascend");
}

#[test]
fn normalization_reverses_raw_order() {
    let (index, _) = pets_index();
    let raw = index.raw_search("dogs cat", 10).expect("raw");
    let normalized = index.search_text("dogs cat", 10).expect("normalized");
    assert_eq!(raw.len(), normalized.len());
    assert!(raw.windows(2).all(|w| w[0].score >= w[1].score));
    for r in &raw {
        let n = normalized.iter().find(|n| Arc::ptr_eq(&n.document, &r.document)).expect("same candidates");
        let expected = (-0.1_f32 * r.score).exp();
        assert!((n.score - expected).abs() < 1e-6);
    }
    for (a, b) in raw.iter().zip(raw.iter().skip(1)) {
        if a.score > b.score {
            let na = normalized.iter().find(|n| Arc::ptr_eq(&n.document, &a.document)).unwrap();
            let nb = normalized.iter().find(|n| Arc::ptr_eq(&n.document, &b.document)).unwrap();
            assert!(na.score < nb.score);
        }
    }
}

#[test]
fn term_frequency_is_monotonic() {
    let fillers = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];
    let mut previous = 0.0_f32;
    for repeats in 1..=fillers.len() {
        // Same length every round: only the needle's frequency changes.
        let mut words = vec!["needle"; repeats];
        words.extend_from_slice(&fillers[repeats..]);
        words.resize(fillers.len(), "needle");
        let mut index = Bm25Index::new();
        index.add_document(Arc::new(Document::new(words.join(" ")))).unwrap();
        index.add_document(Arc::new(Document::new("unrelated words only here"))).unwrap();
        let score = index.raw_search("needle", 1).unwrap()[0].score;
        assert!(score >= previous, "tf={repeats} scored {score} after {previous}");
        previous = score;
    }
}

#[test]
fn degenerate_inputs_return_empty() {
    let empty = Bm25Index::new();
    assert!(empty.search_text("anything", 3).unwrap().is_empty());
    assert!(empty.search_text("anything", 0).unwrap().is_empty(), "empty index short-circuits before k validation");

    let (index, _) = pets_index();
    assert!(index.search_text("?!", 3).unwrap().is_empty());
    assert!(index.search_text("zebra", 3).unwrap().is_empty());
}

#[test]
fn zero_k_fails_on_populated_index() {
    let (index, _) = pets_index();
    assert!(matches!(index.search_text("cat", 0), Err(Error::InvalidK)));
}

#[test]
fn batch_insert_is_all_or_nothing() {
    let mut index = Bm25Index::new();
    let docs = vec![Arc::new(Document::new("fine")), Arc::new(Document::new(""))];
    assert!(index.add_documents(&docs).is_err());
    assert_eq!(index.len(), 0);
}

#[test]
fn custom_tokenizer_and_settings() {
    let mut index = Bm25Index::with_settings(Bm25Settings { k1: 1.2, b: 0.5, normalization_factor: 0.5 })
        .unwrap()
        .with_tokenizer(|text: &str| text.split(',').map(|t| t.trim().to_string()).collect::<Vec<_>>());
    index.add_document(Arc::new(Document::new("send message, get updates"))).unwrap();
    index.add_document(Arc::new(Document::new("set webhook"))).unwrap();
    let hits = index.search_text("get updates", 5).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(index.search_text("updates", 5).unwrap().is_empty(), "comma tokenizer keeps phrases whole");
}
