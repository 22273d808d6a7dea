//! Live PubMed smoke test.
//!
//! Run with: cargo test -p citeseek-pipeline --test pubmed_live -- --ignored --nocapture

use std::time::Duration;

use citeseek_pipeline::models::SearchFilters;
use citeseek_pipeline::parser::parse_abstract_xml;
use citeseek_pipeline::sources::pubmed::PubMedClient;
use citeseek_pipeline::sources::LiteratureSource;

#[tokio::test]
#[ignore] // Requires network access
async fn test_pubmed_search_and_abstract_fetch() {
    let client = PubMedClient::new(None, Duration::from_secs(30)).unwrap();

    let pmids = client
        .search("diabetic macular edema treatment", 5)
        .await
        .expect("esearch failed");
    assert!(!pmids.is_empty(), "should find at least one article");

    let xml = client.fetch_abstracts(&pmids).await.expect("efetch failed");
    let docs = parse_abstract_xml(&xml, &SearchFilters::default());

    println!("parsed {} documents from {} articles", docs.len(), pmids.len());
    for doc in &docs {
        println!("{}: {} chars", doc.metadata.citation, doc.content.len());
        assert!(!doc.content.is_empty());
        assert!(!doc.metadata.pmid.is_empty());
    }
}
