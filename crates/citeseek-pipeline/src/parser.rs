//! Article normalization: two heterogeneous raw formats in, one Document
//! model out.
//!
//! Abstract path: walks the batched efetch XML with a quick-xml state
//! machine. Full-text path: typed serde view of the PMC BioC JSON.
//!
//! Contract: a Document is only emitted when the article has non-empty text
//! and a complete citation (first author, year, pmid). Anything less skips
//! that one article with a warning, never the whole batch.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{DocMetadata, Document, SearchFilters};

// ── Abstract path (efetch XML) ───────────────────────────────────────────────

#[derive(Default)]
struct ArticleDraft {
    pmid: Option<String>,
    abstract_parts: Vec<String>,
    first_author: Option<String>,
    year: Option<String>,
}

impl ArticleDraft {
    /// Promote to a Document if every citation component is present and the
    /// completion year passes the post-filter.
    fn finish(self, filters: &SearchFilters) -> Option<Document> {
        let pmid = self.pmid?;
        let abstract_text = self.abstract_parts.join(" ");
        if abstract_text.trim().is_empty() {
            debug!(pmid, "skipping article without abstract");
            return None;
        }
        let (author, year) = match (self.first_author, self.year) {
            (Some(a), Some(y)) if !a.is_empty() => (a, y),
            _ => {
                warn!(pmid, "skipping article with incomplete citation metadata");
                return None;
            }
        };
        let year_num: u16 = match year.parse() {
            Ok(y) => y,
            Err(_) => {
                warn!(pmid, year, "skipping article with unparseable year");
                return None;
            }
        };
        if !filters.year_in_range(year_num) {
            debug!(pmid, year_num, "article outside requested year range");
            return None;
        }

        let citation = format!("({} {} - {})", author, year, pmid);
        Some(Document {
            content: abstract_text,
            metadata: DocMetadata::abstract_only(pmid, citation),
        })
    }
}

/// Parse the batched efetch XML into Documents, one per article that has an
/// abstract and complete citation metadata.
pub fn parse_abstract_xml(xml: &str, filters: &SearchFilters) -> Vec<Document> {
    let mut docs = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current: Option<ArticleDraft> = None;
    let mut in_pmid = false;
    let mut in_abstract = false;
    let mut abstract_text = String::new();
    let mut in_author_list = false;
    let mut in_last_name = false;
    let mut in_date_completed = false;
    let mut in_year = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"PubmedArticle" => current = Some(ArticleDraft::default()),
                b"PMID" => in_pmid = true,
                b"AbstractText" => {
                    in_abstract = true;
                    abstract_text.clear();
                }
                b"AuthorList" => in_author_list = true,
                b"LastName" => in_last_name = true,
                b"DateCompleted" => in_date_completed = true,
                b"Year" => in_year = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let Some(ref mut draft) = current {
                    if in_pmid && draft.pmid.is_none() {
                        draft.pmid = Some(text.clone());
                    }
                    if in_abstract {
                        // Structured abstracts arrive as several labelled
                        // AbstractText nodes; inline markup is flattened here.
                        if !abstract_text.is_empty() {
                            abstract_text.push(' ');
                        }
                        abstract_text.push_str(&text);
                    }
                    if in_last_name && in_author_list && draft.first_author.is_none() {
                        draft.first_author = Some(text.clone());
                    }
                    if in_year && in_date_completed && draft.year.is_none() {
                        draft.year = Some(text.clone());
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"PMID" => in_pmid = false,
                b"AbstractText" => {
                    in_abstract = false;
                    if let Some(ref mut draft) = current {
                        if !abstract_text.trim().is_empty() {
                            draft.abstract_parts.push(abstract_text.trim().to_string());
                        }
                    }
                }
                b"AuthorList" => in_author_list = false,
                b"LastName" => in_last_name = false,
                b"DateCompleted" => in_date_completed = false,
                b"Year" => in_year = false,
                b"PubmedArticle" => {
                    if let Some(draft) = current.take() {
                        if let Some(doc) = draft.finish(filters) {
                            docs.push(doc);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("abstract XML parse error: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    debug!(n = docs.len(), "abstract parse complete");
    docs
}

// ── Full-text path (PMC BioC JSON) ───────────────────────────────────────────

/// Typed view of the BioC collection returned by pmcoa.cgi. Every field the
/// upstream may omit is optional; nothing here is accessed dynamically.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BiocCollection {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub documents: Vec<BiocDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BiocDocument {
    #[serde(default)]
    pub passages: Vec<BiocPassage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BiocPassage {
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub infons: BiocInfons,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BiocInfons {
    #[serde(default)]
    pub section_type: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Semicolon-delimited author list, entries like "surname:Smith".
    #[serde(default)]
    pub name_0: Option<String>,
}

/// First author's surname from the `name_0` infon on the first passage.
///
/// The upstream format is a fixed coupling (first entry, "surname:" prefix);
/// it is validated here so drift yields a skipped article, not a panic.
fn lead_author(collection: &BiocCollection) -> Option<String> {
    let name_field = collection
        .documents
        .first()?
        .passages
        .first()?
        .infons
        .name_0
        .as_deref()?;
    let surname = name_field
        .split(';')
        .next()?
        .strip_prefix("surname:")?
        .trim();
    if surname.is_empty() {
        None
    } else {
        Some(surname.to_string())
    }
}

/// Parse a BioC collection into one Document per non-empty passage, all
/// sharing the article-level citation.
pub fn parse_full_text(
    collection: &BiocCollection,
    pmid: &str,
    filters: &SearchFilters,
) -> Vec<Document> {
    let Some(author) = lead_author(collection) else {
        warn!(pmid, "skipping full-text article without parseable lead author");
        return Vec::new();
    };

    let year_str: String = collection.date.chars().take(4).collect();
    let Ok(year) = year_str.parse::<u16>() else {
        warn!(pmid, date = %collection.date, "skipping full-text article without usable date");
        return Vec::new();
    };
    if !filters.year_in_range(year) {
        debug!(pmid, year, "full-text article outside requested year range");
        return Vec::new();
    }

    let citation = format!("({} {} - {})", author, year_str, pmid);

    let mut docs = Vec::new();
    for document in &collection.documents {
        for passage in &document.passages {
            let Some(text) = passage.text.as_deref() else { continue };
            if text.trim().is_empty() {
                continue;
            }
            docs.push(Document {
                content: text.to_string(),
                metadata: DocMetadata {
                    pmid: pmid.to_string(),
                    citation: citation.clone(),
                    offset: Some(passage.offset),
                    section_type: passage.infons.section_type.as_ref().map(|s| s.to_lowercase()),
                    kind: passage.infons.kind.as_ref().map(|s| s.to_lowercase()),
                },
            });
        }
    }

    debug!(pmid, n = docs.len(), "full-text parse complete");
    docs
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ARTICLE_XML: &str = r#"<?xml version="1.0"?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID>11111111</PMID>
      <DateCompleted><Year>2021</Year><Month>03</Month></DateCompleted>
      <Article>
        <ArticleTitle>Anti-VEGF therapy in DME</ArticleTitle>
        <Abstract><AbstractText>Ranibizumab improves visual acuity.</AbstractText></Abstract>
        <AuthorList>
          <Author><LastName>Nguyen</LastName><ForeName>Quan</ForeName></Author>
          <Author><LastName>Brown</LastName><ForeName>David</ForeName></Author>
        </AuthorList>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation>
      <PMID>22222222</PMID>
      <DateCompleted><Year>2019</Year></DateCompleted>
      <Article>
        <ArticleTitle>An editorial without an abstract</ArticleTitle>
        <AuthorList>
          <Author><LastName>Editor</LastName></Author>
        </AuthorList>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn test_article_without_abstract_is_skipped() {
        let docs = parse_abstract_xml(TWO_ARTICLE_XML, &SearchFilters::default());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].metadata.pmid, "11111111");
        assert_eq!(docs[0].metadata.citation, "(Nguyen 2021 - 11111111)");
        assert_eq!(docs[0].content, "Ranibizumab improves visual acuity.");
    }

    #[test]
    fn test_structured_abstract_is_flattened() {
        let xml = r#"<PubmedArticleSet><PubmedArticle><MedlineCitation>
          <PMID>33333333</PMID>
          <DateCompleted><Year>2020</Year></DateCompleted>
          <Article>
            <Abstract>
              <AbstractText Label="BACKGROUND">DME is common.</AbstractText>
              <AbstractText Label="RESULTS">Treatment works.</AbstractText>
            </Abstract>
            <AuthorList><Author><LastName>Wells</LastName></Author></AuthorList>
          </Article>
        </MedlineCitation></PubmedArticle></PubmedArticleSet>"#;
        let docs = parse_abstract_xml(xml, &SearchFilters::default());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "DME is common. Treatment works.");
    }

    #[test]
    fn test_missing_citation_component_skips_only_that_article() {
        // No AuthorList on the first article; second is complete.
        let xml = r#"<PubmedArticleSet>
          <PubmedArticle><MedlineCitation>
            <PMID>44444444</PMID>
            <DateCompleted><Year>2018</Year></DateCompleted>
            <Article><Abstract><AbstractText>Orphan abstract.</AbstractText></Abstract></Article>
          </MedlineCitation></PubmedArticle>
          <PubmedArticle><MedlineCitation>
            <PMID>55555555</PMID>
            <DateCompleted><Year>2018</Year></DateCompleted>
            <Article>
              <Abstract><AbstractText>Complete article.</AbstractText></Abstract>
              <AuthorList><Author><LastName>Khan</LastName></Author></AuthorList>
            </Article>
          </MedlineCitation></PubmedArticle>
        </PubmedArticleSet>"#;
        let docs = parse_abstract_xml(xml, &SearchFilters::default());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].metadata.pmid, "55555555");
    }

    #[test]
    fn test_year_range_post_filter() {
        let filters = SearchFilters { year_range: (2000, 2010), ..Default::default() };
        let docs = parse_abstract_xml(TWO_ARTICLE_XML, &filters);
        assert!(docs.is_empty());
    }

    #[test]
    fn test_no_empty_documents_emitted() {
        let docs = parse_abstract_xml(TWO_ARTICLE_XML, &SearchFilters::default());
        for doc in &docs {
            assert!(!doc.content.is_empty());
            assert!(!doc.metadata.pmid.is_empty());
        }
    }

    fn sample_collection() -> BiocCollection {
        serde_json::from_str(
            r#"{
              "date": "20220415",
              "documents": [{
                "passages": [
                  {
                    "offset": 0,
                    "infons": {
                      "section_type": "TITLE",
                      "type": "front",
                      "name_0": "surname:Garcia;given-names:Maria"
                    },
                    "text": "Intravitreal therapy outcomes"
                  },
                  {
                    "offset": 120,
                    "infons": {"section_type": "INTRO", "type": "paragraph"},
                    "text": "Diabetic macular edema affects millions."
                  },
                  {
                    "offset": 400,
                    "infons": {"section_type": "FIG", "type": "fig_caption"},
                    "text": "   "
                  }
                ]
              }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_full_text_passages_share_citation() {
        let docs = parse_full_text(&sample_collection(), "66666666", &SearchFilters::default());
        assert_eq!(docs.len(), 2); // blank passage dropped
        for doc in &docs {
            assert_eq!(doc.metadata.citation, "(Garcia 2022 - 66666666)");
            assert_eq!(doc.metadata.pmid, "66666666");
        }
        assert_eq!(docs[0].metadata.section_type.as_deref(), Some("title"));
        assert_eq!(docs[1].metadata.kind.as_deref(), Some("paragraph"));
        assert_eq!(docs[1].metadata.offset, Some(120));
    }

    #[test]
    fn test_full_text_without_author_infon_is_skipped() {
        let mut collection = sample_collection();
        collection.documents[0].passages[0].infons.name_0 = None;
        let docs = parse_full_text(&collection, "66666666", &SearchFilters::default());
        assert!(docs.is_empty());
    }

    #[test]
    fn test_full_text_with_malformed_author_infon_is_skipped() {
        let mut collection = sample_collection();
        // Prefix drifted upstream: must skip, not panic or mis-slice.
        collection.documents[0].passages[0].infons.name_0 =
            Some("family:Garcia;given-names:Maria".to_string());
        let docs = parse_full_text(&collection, "66666666", &SearchFilters::default());
        assert!(docs.is_empty());
    }

    #[test]
    fn test_full_text_year_filter() {
        let filters = SearchFilters { year_range: (1990, 2000), ..Default::default() };
        let docs = parse_full_text(&sample_collection(), "66666666", &filters);
        assert!(docs.is_empty());
    }
}
