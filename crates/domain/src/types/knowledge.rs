//! Knowledge base records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_intent() -> String {
    "general_query".to_string()
}

/// Question and canned answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_intent")]
    pub intent: String,
}

impl QaPair {
    pub fn new(question: &str, answer: &str, keywords: &[&str], intent: &str) -> Self {
        Self {
            question: question.to_string(),
            answer: answer.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            intent: intent.to_string(),
        }
    }
}

/// Pair plus its category, used by bulk imports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedQaPair {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(flatten)]
    pub pair: QaPair,
}

fn default_category() -> String {
    "general".to_string()
}

/// Category name to pairs, ordered by category
pub type KnowledgeCategories = BTreeMap<String, Vec<QaPair>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarQuestion {
    pub question: String,
    pub answer: String,
    pub relevance_score: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeHit {
    pub question: String,
    pub answer: String,
    pub category: String,
    pub relevance_score: usize,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub total_qa_pairs: usize,
    pub categories: Vec<String>,
    pub category_counts: BTreeMap<String, usize>,
    pub keywords_coverage: BTreeMap<String, usize>,
}

/// Summary of a parsed Q&A document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub total_qa_pairs: usize,
    pub category_counts: BTreeMap<String, usize>,
    pub intent_counts: BTreeMap<String, usize>,
}

impl ParseStats {
    pub fn from_categories(categories: &KnowledgeCategories) -> Self {
        let mut stats = Self::default();
        for (category, pairs) in categories {
            stats.total_qa_pairs += pairs.len();
            stats.category_counts.insert(category.clone(), pairs.len());
            for pair in pairs {
                *stats.intent_counts.entry(pair.intent.clone()).or_default() += 1;
            }
        }
        stats
    }
}
