//! PubMed E-utilities and PMC BioC clients.
//!
//! Endpoints used:
//!   esearch:  https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi
//!   efetch:   https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi
//!   BioC OA:  https://www.ncbi.nlm.nih.gov/research/bionlp/RESTful/pmcoa.cgi

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use citeseek_common::{PipelineError, Result};

use super::LiteratureSource;
use crate::parser::BiocCollection;

const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";
const BIOC_URL: &str = "https://www.ncbi.nlm.nih.gov/research/bionlp/RESTful/pmcoa.cgi/BioC_json";

pub struct PubMedClient {
    client: reqwest::Client,
    /// Optional NCBI API key for higher rate limits. Not the LLM credential.
    api_key: Option<String>,
}

impl PubMedClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("citeseek/0.1 (research)")
            .build()
            .map_err(|e| PipelineError::UpstreamUnavailable(e.to_string()))?;
        Ok(Self { client, api_key })
    }

    fn key_param(&self) -> Option<(&'static str, String)> {
        self.api_key.as_ref().map(|k| ("api_key", k.clone()))
    }
}

#[async_trait]
impl LiteratureSource for PubMedClient {
    /// Search PubMed, returning PMIDs in relevance order.
    #[instrument(skip(self))]
    async fn search(&self, term: &str, max_results: usize) -> Result<Vec<String>> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("retmode", "json".to_string()),
            ("sort", "relevance".to_string()),
            ("retmax", max_results.to_string()),
            ("term", term.to_string()),
        ];
        params.extend(self.key_param());

        let resp = self.client.get(ESEARCH_URL).query(&params).send().await?;
        if !resp.status().is_success() {
            return Err(PipelineError::UpstreamUnavailable(format!(
                "esearch HTTP {}",
                resp.status()
            )));
        }
        let body: serde_json::Value = resp.json().await?;

        let ids = body["esearchresult"]["idlist"]
            .as_array()
            .ok_or_else(|| {
                PipelineError::MalformedResponse("esearch response lacks esearchresult.idlist".into())
            })?
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect::<Vec<_>>();

        debug!(n = ids.len(), "esearch returned PMIDs");
        Ok(ids)
    }

    /// One batched efetch for all PMIDs; returns the raw XML tree.
    #[instrument(skip(self), fields(n = pmids.len()))]
    async fn fetch_abstracts(&self, pmids: &[String]) -> Result<String> {
        if pmids.is_empty() {
            return Ok(String::new());
        }

        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", pmids.join(",")),
            ("rettype", "abstract".to_string()),
            ("retmode", "xml".to_string()),
        ];
        params.extend(self.key_param());

        let resp = self.client.get(EFETCH_URL).query(&params).send().await?;
        if !resp.status().is_success() {
            return Err(PipelineError::UpstreamUnavailable(format!(
                "efetch HTTP {}",
                resp.status()
            )));
        }
        Ok(resp.text().await?)
    }

    /// Open-access BioC full text for one article.
    ///
    /// Articles without an open-access rendering come back as an error page
    /// or non-JSON body; both mean "drop this article", not "fail the run".
    #[instrument(skip(self))]
    async fn fetch_full_text(&self, pmid: &str) -> Result<Option<BiocCollection>> {
        let url = format!("{}/{}/unicode", BIOC_URL, pmid);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            debug!(pmid, status = %resp.status(), "no open-access full text");
            return Ok(None);
        }

        let body = resp.text().await?;
        match serde_json::from_str::<BiocCollection>(&body) {
            Ok(collection) => Ok(Some(collection)),
            Err(e) => {
                // The endpoint reports "no result" as plain text, not JSON.
                warn!(pmid, error = %e, "BioC payload not parseable, dropping article");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ncbi_key_becomes_query_param() {
        let client =
            PubMedClient::new(Some("ncbi-test".to_string()), Duration::from_secs(5)).unwrap();
        assert_eq!(client.key_param(), Some(("api_key", "ncbi-test".to_string())));
    }

    #[test]
    fn test_no_key_adds_no_param() {
        let client = PubMedClient::new(None, Duration::from_secs(5)).unwrap();
        assert_eq!(client.key_param(), None);
    }
}
