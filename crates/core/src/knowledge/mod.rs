//! Scheduling knowledge base used by the agent
//!
//! Questions are grouped by category. Matching is keyword and word-overlap
//! based; there is no embedding or ranking model behind it.

pub mod parser;
pub mod seed;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use slotwise_domain::{
    CategorizedQaPair, KnowledgeCategories, KnowledgeHit, KnowledgeStats, QaPair, SimilarQuestion,
};

pub const DEFAULT_SEARCH_LIMIT: usize = 5;
const SIMILAR_LIMIT: usize = 3;

/// In-memory knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub categories: KnowledgeCategories,
    pub common_patterns: BTreeMap<String, Vec<String>>,
    pub best_practices: BTreeMap<String, Vec<String>>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self {
            categories: seed::default_categories(),
            common_patterns: seed::common_patterns(),
            best_practices: seed::best_practices(),
        }
    }
}

impl KnowledgeBase {
    /// A knowledge base with no categories, patterns or practices.
    pub fn empty() -> Self {
        Self {
            categories: KnowledgeCategories::new(),
            common_patterns: BTreeMap::new(),
            best_practices: BTreeMap::new(),
        }
    }

    fn pairs(&self) -> impl Iterator<Item = (&String, &QaPair)> {
        self.categories
            .iter()
            .flat_map(|(category, pairs)| pairs.iter().map(move |p| (category, p)))
    }

    /// Pairs whose keywords appear in the message or whose intent matches
    pub fn relevant_qa(&self, message: &str, intent: Option<&str>) -> Vec<QaPair> {
        let message = message.to_lowercase();
        self.pairs()
            .filter(|(_, qa)| {
                qa.keywords.iter().any(|k| message.contains(&k.to_lowercase()))
                    || intent.is_some_and(|i| qa.intent == i)
            })
            .map(|(_, qa)| qa.clone())
            .collect()
    }

    pub fn find_similar_questions(&self, message: &str) -> Vec<SimilarQuestion> {
        let message = message.to_lowercase();
        let words: Vec<&str> = message.split_whitespace().collect();
        let mut similar: Vec<SimilarQuestion> = self
            .pairs()
            .filter_map(|(_, qa)| {
                let question = qa.question.to_lowercase();
                let keyword_overlap =
                    qa.keywords.iter().filter(|k| message.contains(&k.to_lowercase())).count();
                let word_overlap = words.iter().filter(|w| question.contains(**w)).count();
                (keyword_overlap > 0 || word_overlap > 1).then(|| SimilarQuestion {
                    question: qa.question.clone(),
                    answer: qa.answer.clone(),
                    relevance_score: keyword_overlap + word_overlap,
                })
            })
            .collect();
        similar.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
        similar.truncate(SIMILAR_LIMIT);
        similar
    }

    /// Scored search: keywords weigh 3, question words 2, answer words 1
    pub fn search(&self, query: &str, limit: usize) -> Vec<KnowledgeHit> {
        let query = query.to_lowercase();
        let query_words: HashSet<&str> = query.split_whitespace().collect();
        let mut hits: Vec<KnowledgeHit> = self
            .pairs()
            .filter_map(|(category, qa)| {
                let keywords: Vec<String> = qa.keywords.iter().map(|k| k.to_lowercase()).collect();
                let question = qa.question.to_lowercase();
                let answer = qa.answer.to_lowercase();
                let question_words: HashSet<&str> = question.split_whitespace().collect();
                let answer_words: HashSet<&str> = answer.split_whitespace().collect();

                let score = keywords.iter().filter(|k| query.contains(k.as_str())).count() * 3
                    + query_words.intersection(&question_words).count() * 2
                    + query_words.intersection(&answer_words).count();
                (score > 0).then(|| KnowledgeHit {
                    question: qa.question.clone(),
                    answer: qa.answer.clone(),
                    category: category.clone(),
                    relevance_score: score,
                    keywords,
                })
            })
            .collect();
        hits.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
        hits.truncate(limit);
        hits
    }

    pub fn stats(&self) -> KnowledgeStats {
        let mut keywords_coverage = BTreeMap::new();
        for (_, qa) in self.pairs() {
            for keyword in &qa.keywords {
                *keywords_coverage.entry(keyword.clone()).or_insert(0) += 1;
            }
        }
        KnowledgeStats {
            total_qa_pairs: self.categories.values().map(Vec::len).sum(),
            categories: self.categories.keys().cloned().collect(),
            category_counts: self.categories.iter().map(|(c, p)| (c.clone(), p.len())).collect(),
            keywords_coverage,
        }
    }

    pub fn add_qa_pair(&mut self, category: &str, pair: QaPair) {
        self.categories.entry(category.to_string()).or_default().push(pair);
    }

    pub fn bulk_add(&mut self, pairs: Vec<CategorizedQaPair>) -> usize {
        let count = pairs.len();
        for entry in pairs {
            self.add_qa_pair(&entry.category, entry.pair);
        }
        count
    }

    /// Append parsed categories, returning the number of pairs added
    pub fn merge(&mut self, incoming: KnowledgeCategories) -> usize {
        let mut added = 0;
        for (category, pairs) in incoming {
            added += pairs.len();
            self.categories.entry(category).or_default().extend(pairs);
        }
        added
    }

    pub fn common_patterns(&self, category: Option<&str>) -> BTreeMap<String, Vec<String>> {
        Self::select(&self.common_patterns, category)
    }

    pub fn best_practices(&self, category: Option<&str>) -> BTreeMap<String, Vec<String>> {
        Self::select(&self.best_practices, category)
    }

    fn select(
        map: &BTreeMap<String, Vec<String>>,
        category: Option<&str>,
    ) -> BTreeMap<String, Vec<String>> {
        match category {
            Some(category) => {
                let entries = map.get(category).cloned().unwrap_or_default();
                BTreeMap::from([(category.to_string(), entries)])
            }
            None => map.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_has_expected_shape() {
        let stats = KnowledgeBase::default().stats();
        assert_eq!(stats.total_qa_pairs, 13);
        assert_eq!(stats.category_counts["scheduling"], 5);
        assert_eq!(stats.category_counts["troubleshooting"], 3);
        assert_eq!(stats.keywords_coverage["calendar"], 2);
    }

    #[test]
    fn relevant_qa_matches_keywords_or_intent() {
        let kb = KnowledgeBase::default();
        let by_keyword = kb.relevant_qa("I need to cancel", None);
        assert!(by_keyword.iter().any(|qa| qa.question == "How do I cancel a meeting?"));

        let by_intent = kb.relevant_qa("zzz", Some("settings"));
        assert_eq!(by_intent.len(), 2);
    }

    #[test]
    fn search_ranks_keyword_hits_first() {
        let kb = KnowledgeBase::default();
        let hits = kb.search("reschedule", DEFAULT_SEARCH_LIMIT);
        assert_eq!(hits[0].question, "How do I reschedule a meeting?");
        assert!(hits.len() <= DEFAULT_SEARCH_LIMIT);
        assert!(hits.windows(2).all(|w| w[0].relevance_score >= w[1].relevance_score));
        assert!(kb.search("qqqq", 5).is_empty());
    }

    #[test]
    fn similar_questions_are_capped() {
        let kb = KnowledgeBase::default();
        let similar = kb.find_similar_questions("how do i schedule a meeting call");
        assert_eq!(similar.len(), 3);
        assert_eq!(similar[0].question, "How do I schedule a meeting?");
    }

    #[test]
    fn merge_appends_to_existing_categories() {
        let mut kb = KnowledgeBase::default();
        let parsed = parser::parse_custom_qa("Scheduling\nUser: Book lunch\nAgent: Done");
        assert_eq!(kb.merge(parsed), 1);
        assert_eq!(kb.categories["scheduling"].len(), 6);
        assert_eq!(kb.best_practices(Some("missing"))["missing"].len(), 0);
    }
}
