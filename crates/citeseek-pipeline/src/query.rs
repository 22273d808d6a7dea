//! PubMed search term construction.
//!
//! Pure function of the question and filters: no I/O, no hidden state.
//! A filter the term syntax cannot express (the year range) is not dropped
//! here — it stays on `SearchFilters` and is applied as a post-filter when
//! articles are parsed.

use crate::models::SearchFilters;

const OPEN_ACCESS_CLAUSE: &str = "pubmed pmc open access[filter]";

/// Build the esearch `term` parameter.
///
/// A non-empty `custom_query` overrides the question entirely (advanced
/// mode); otherwise the question text is the search term verbatim. The
/// open-access clause is conjoined when requested.
pub fn build_search_term(question: &str, filters: &SearchFilters) -> String {
    let base = match filters.custom_query.as_deref() {
        Some(custom) if !custom.trim().is_empty() => custom.trim(),
        _ => question.trim(),
    };

    if filters.open_access_only {
        format!("({}) AND ({})", OPEN_ACCESS_CLAUSE, base)
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_used_verbatim() {
        let term = build_search_term("treatments for DME", &SearchFilters::default());
        assert_eq!(term, "treatments for DME");
    }

    #[test]
    fn test_open_access_clause_present_iff_requested() {
        let mut filters = SearchFilters::default();
        let term = build_search_term("macular edema", &filters);
        assert!(!term.contains(OPEN_ACCESS_CLAUSE));

        filters.open_access_only = true;
        let term = build_search_term("macular edema", &filters);
        assert!(term.contains(OPEN_ACCESS_CLAUSE));
        assert!(term.contains("macular edema"));
    }

    #[test]
    fn test_custom_query_overrides_question() {
        let filters = SearchFilters {
            custom_query: Some("ranibizumab[tiab] AND DME[tiab]".to_string()),
            ..Default::default()
        };
        let term = build_search_term("ignored question", &filters);
        assert_eq!(term, "ranibizumab[tiab] AND DME[tiab]");
    }

    #[test]
    fn test_blank_custom_query_falls_back_to_question() {
        let filters = SearchFilters {
            custom_query: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(build_search_term("real question", &filters), "real question");
    }

    #[test]
    fn test_deterministic() {
        let filters = SearchFilters { open_access_only: true, ..Default::default() };
        let a = build_search_term("diabetic retinopathy", &filters);
        let b = build_search_term("diabetic retinopathy", &filters);
        assert_eq!(a, b);
    }
}
