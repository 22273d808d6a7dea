//! Citation deduplication and BibTeX generation.
//!
//! Dedup key is the article identifier, not the passage: multiple passages
//! from one article collapse to a single citation, keeping first-occurrence
//! order.

use tracing::warn;

use crate::models::Passage;

/// Parsed components of a "(LastName Year - PMID)" citation string.
#[derive(Debug, Clone, PartialEq)]
pub struct CitationParts {
    pub author: String,
    pub year: String,
    pub pmid: String,
}

/// Parse a short citation string back into its components.
pub fn parse_citation(citation: &str) -> Option<CitationParts> {
    let inner = citation.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (head, pmid) = inner.rsplit_once(" - ")?;
    let (author, year) = head.rsplit_once(' ')?;
    if author.is_empty() || pmid.is_empty() {
        return None;
    }
    year.parse::<u16>().ok()?;
    Some(CitationParts {
        author: author.to_string(),
        year: year.to_string(),
        pmid: pmid.trim().to_string(),
    })
}

pub struct Bibliography {
    /// Unique PMIDs in first-occurrence order.
    pub pmids: Vec<String>,
    /// One BibTeX entry per unique PMID, same order, blank-line separated.
    pub bibtex: String,
}

/// Build the deduplicated citation list and bibliography for the passages
/// the synthesizer actually used.
pub fn build_bibliography(used: &[Passage]) -> Bibliography {
    let mut pmids: Vec<String> = Vec::new();
    let mut entries: Vec<String> = Vec::new();

    for passage in used {
        let pmid = &passage.metadata.pmid;
        if pmids.iter().any(|p| p == pmid) {
            continue;
        }
        pmids.push(pmid.clone());

        match parse_citation(&passage.metadata.citation) {
            Some(parts) => entries.push(bibtex_entry(&parts)),
            None => {
                // Parser guarantees well-formed citations; tolerate drift
                // with a minimal entry rather than dropping the source.
                warn!(pmid, citation = %passage.metadata.citation, "unparseable citation string");
                entries.push(format!(
                    "@article{{pmid{pmid},\n  note = {{PMID: {pmid}}}\n}}"
                ));
            }
        }
    }

    Bibliography { pmids, bibtex: entries.join("\n\n") }
}

fn bibtex_entry(parts: &CitationParts) -> String {
    format!(
        "@article{{pmid{pmid},\n  author = {{{author}}},\n  year = {{{year}}},\n  note = {{PMID: {pmid}}},\n  url = {{https://pubmed.ncbi.nlm.nih.gov/{pmid}/}}\n}}",
        pmid = parts.pmid,
        author = parts.author,
        year = parts.year,
    )
}
