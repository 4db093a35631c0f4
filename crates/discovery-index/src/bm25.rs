//! Hand-rolled BM25 over a per-request candidate set
//!
//! Document frequency is counted over the candidates only, not the corpus.
//! Field importance comes from repeating title and tag terms in the weighted
//! text rather than from a multi-field formula.

use discovery_core::tokenizer::{tokenize, tokenize_query};
use discovery_core::{Bm25Params, Document, RankedDocument};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

const TITLE_WEIGHT: usize = 3;
const TAG_WEIGHT: usize = 3;

#[derive(Debug, Clone)]
pub struct Bm25Ranker {
    params: Bm25Params,
}

impl Bm25Ranker {
    pub fn new(params: Bm25Params) -> Self {
        Self { params }
    }

    /// Score and order `candidates` for `query`.
    ///
    /// `limit` of `None` or `Some(0)` keeps every candidate. A blank query or an
    /// empty candidate set skips scoring and orders by recency.
    pub fn rank(
        &self,
        query: &str,
        candidates: Vec<Document>,
        limit: Option<usize>,
    ) -> Vec<RankedDocument> {
        let query = query.trim();
        if query.is_empty() || candidates.is_empty() {
            return by_recency(candidates, limit);
        }

        let terms = query_terms(query);
        let stats = CandidateStats::build(&candidates);

        let mut ranked: Vec<RankedDocument> = candidates
            .into_iter()
            .enumerate()
            .map(|(idx, document)| RankedDocument {
                score: stats.score(idx, &terms, &self.params),
                document,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| newest_first(&a.document, &b.document))
        });
        apply_limit(&mut ranked, limit);
        ranked
    }
}

impl Default for Bm25Ranker {
    fn default() -> Self {
        Self::new(Bm25Params::default())
    }
}

/// Deduplicated query terms, falling back to the raw lower-cased query
pub fn query_terms(query: &str) -> Vec<String> {
    let terms = tokenize_query(query);
    if terms.is_empty() {
        vec![query.trim().to_lowercase()]
    } else {
        terms
    }
}

/// Title ×3, tags ×3, body, author, circle
pub fn weighted_terms(doc: &Document) -> Vec<String> {
    let title = tokenize(&doc.title);
    let tags = tokenize(&doc.tags.join(" "));

    let mut terms = Vec::new();
    for _ in 0..TITLE_WEIGHT {
        terms.extend(title.iter().cloned());
    }
    for _ in 0..TAG_WEIGHT {
        terms.extend(tags.iter().cloned());
    }
    terms.extend(tokenize(&doc.content));
    terms.extend(tokenize(&doc.author_name));
    if let Some(circle) = &doc.circle_name {
        terms.extend(tokenize(circle));
    }
    terms
}

#[derive(Debug)]
struct CandidateStats {
    doc_count: usize,
    avg_doc_len: f64,
    doc_lens: Vec<usize>,
    term_freqs: Vec<HashMap<String, usize>>,
    doc_freq: HashMap<String, usize>,
}

impl CandidateStats {
    fn build(candidates: &[Document]) -> Self {
        let mut doc_lens = Vec::with_capacity(candidates.len());
        let mut term_freqs = Vec::with_capacity(candidates.len());
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut total_len = 0;

        for doc in candidates {
            let terms = weighted_terms(doc);
            doc_lens.push(terms.len());
            total_len += terms.len();

            let unique: HashSet<&String> = terms.iter().collect();
            for term in unique {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }

            let mut tf: HashMap<String, usize> = HashMap::new();
            for term in terms {
                *tf.entry(term).or_insert(0) += 1;
            }
            term_freqs.push(tf);
        }

        let doc_count = candidates.len();
        let avg_doc_len = if doc_count == 0 {
            0.0
        } else {
            total_len as f64 / doc_count as f64
        };

        Self {
            doc_count,
            avg_doc_len,
            doc_lens,
            term_freqs,
            doc_freq,
        }
    }

    fn idf(&self, term: &str) -> f64 {
        let n = self.doc_count as f64;
        let df = self.doc_freq.get(term).copied().unwrap_or(0) as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    fn score(&self, doc_idx: usize, query_terms: &[String], params: &Bm25Params) -> f64 {
        // All-empty candidates: treat every length as average
        let len_ratio = if self.avg_doc_len > 0.0 {
            self.doc_lens[doc_idx] as f64 / self.avg_doc_len
        } else {
            1.0
        };
        let norm = params.k1 * (1.0 - params.b + params.b * len_ratio);

        query_terms
            .iter()
            .filter_map(|term| {
                let tf = *self.term_freqs[doc_idx].get(term)? as f64;
                Some(self.idf(term) * (tf * (params.k1 + 1.0)) / (tf + norm))
            })
            .sum()
    }
}

fn newest_first(a: &Document, b: &Document) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

fn by_recency(mut candidates: Vec<Document>, limit: Option<usize>) -> Vec<RankedDocument> {
    candidates.sort_by(newest_first);
    let mut ranked: Vec<RankedDocument> = candidates
        .into_iter()
        .map(|document| RankedDocument {
            document,
            score: 0.0,
        })
        .collect();
    apply_limit(&mut ranked, limit);
    ranked
}

fn apply_limit(ranked: &mut Vec<RankedDocument>, limit: Option<usize>) {
    if let Some(limit) = limit.filter(|&l| l > 0) {
        ranked.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn doc(id: i64, title: &str, content: &str, tags: &[&str], hour: u32) -> Document {
        Document {
            id,
            title: title.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            author_id: 1,
            author_name: String::new(),
            circle_id: None,
            circle_name: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
            views: 0,
            likes: 0,
        }
    }

    fn ids(ranked: &[RankedDocument]) -> Vec<i64> {
        ranked.iter().map(|r| r.document.id).collect()
    }

    #[test]
    fn test_empty_candidates() {
        let ranker = Bm25Ranker::default();
        assert!(ranker.rank("rust", Vec::new(), Some(10)).is_empty());
    }

    #[test]
    fn test_ranks_relevant_higher() {
        let ranker = Bm25Ranker::default();
        let docs = vec![
            doc(1, "python tips", "programming in python", &[], 1),
            doc(2, "rust tips", "systems programming in rust", &[], 2),
            doc(3, "gardening", "tomatoes", &[], 3),
        ];

        let ranked = ranker.rank("rust programming", docs, None);
        assert_eq!(ranked[0].document.id, 2);
        assert_eq!(ranked[1].document.id, 1);
        assert_eq!(ranked[2].score, 0.0);
    }

    #[test]
    fn test_title_weighting_scenario() {
        let ranker = Bm25Ranker::default();
        let docs = vec![
            doc(1, "cats and dogs", "", &["pets"], 5),
            doc(2, "dog training", "", &["pets", "training"], 1),
        ];

        let ranked = ranker.rank("dog", docs, None);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].document.id, 2);
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[test]
    fn test_higher_tf_never_lowers_score() {
        let ranker = Bm25Ranker::default();
        let base = vec![
            doc(1, "notes", "dog cat bird", &[], 1),
            doc(2, "other", "dog fish fish", &[], 2),
        ];
        let boosted = vec![
            doc(1, "notes", "dog dog bird", &[], 1),
            doc(2, "other", "dog fish fish", &[], 2),
        ];

        let score_of = |ranked: Vec<RankedDocument>| {
            ranked
                .into_iter()
                .find(|r| r.document.id == 1)
                .map(|r| r.score)
                .unwrap()
        };
        let before = score_of(ranker.rank("dog", base, None));
        let after = score_of(ranker.rank("dog", boosted, None));
        assert!(after >= before, "{after} < {before}");
    }

    #[test]
    fn test_ties_break_by_recency() {
        let ranker = Bm25Ranker::default();
        let docs = vec![
            doc(1, "rust", "", &[], 1),
            doc(2, "rust", "", &[], 9),
            doc(3, "rust", "", &[], 4),
        ];
        assert_eq!(ids(&ranker.rank("rust", docs, None)), vec![2, 3, 1]);
    }

    #[test]
    fn test_empty_query_orders_by_recency_with_limit() {
        let ranker = Bm25Ranker::default();
        let docs = vec![
            doc(1, "a", "", &[], 3),
            doc(2, "b", "", &[], 7),
            doc(3, "c", "", &[], 5),
        ];

        let ranked = ranker.rank("   ", docs, Some(2));
        assert_eq!(ids(&ranked), vec![2, 3]);
        assert!(ranked.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_zero_limit_is_unbounded() {
        let ranker = Bm25Ranker::default();
        let docs = vec![doc(1, "rust", "", &[], 1), doc(2, "go", "", &[], 2)];
        assert_eq!(ranker.rank("rust", docs, Some(0)).len(), 2);
    }

    #[test]
    fn test_untokenizable_query_falls_back_to_raw() {
        assert_eq!(query_terms("  ?!  "), vec!["?!"]);
        assert_eq!(query_terms("Rust rust"), vec!["rust"]);
    }

    #[test]
    fn test_weighted_terms_layout() {
        let mut d = doc(1, "Dog", "walks", &["pets"], 1);
        d.author_name = "alice".to_string();
        d.circle_name = Some("Dog Lovers".to_string());

        assert_eq!(
            weighted_terms(&d),
            vec![
                "dog", "dog", "dog", "pets", "pets", "pets", "walks", "alice", "dog", "lovers"
            ]
        );
    }

    #[test]
    fn test_idf_uses_candidate_set_only() {
        let docs = vec![
            doc(1, "rust", "", &[], 1),
            doc(2, "rust", "", &[], 2),
            doc(3, "go", "", &[], 3),
        ];
        let stats = CandidateStats::build(&docs);
        assert!(stats.idf("go") > stats.idf("rust"));
        let expected = ((3.0 - 2.0 + 0.5) / (2.0 + 0.5) + 1.0f64).ln();
        assert!((stats.idf("rust") - expected).abs() < 1e-12);
    }
}
