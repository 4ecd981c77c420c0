use std::fs;
use std::path::Path;

use slotwise_core::knowledge::parser;
use slotwise_domain::{KnowledgeCategories, Result, SlotwiseError};
use tracing::info;

use crate::errors::conversions::to_domain;

/// Document layout, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnowledgeFormat {
    Json,
    Csv,
    /// `User:` / `Agent:` transcripts under category headers
    CustomQa,
}

impl KnowledgeFormat {
    /// Chooses the format by file extension; anything unknown is a transcript.
    pub fn from_path(path: &Path) -> Self {
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::CustomQa,
        }
    }

    pub fn parse(self, content: &str) -> Result<KnowledgeCategories> {
        match self {
            Self::Json => parser::parse_json(content),
            Self::Csv => parser::parse_csv(content),
            Self::CustomQa => Ok(parser::parse_custom_qa(content)),
        }
    }
}

/// Read and parse a knowledge file.
///
/// Returns `NotFound` for a missing file and `InvalidInput` when the document
/// holds no question/answer pairs.
pub fn load_knowledge_file(path: impl AsRef<Path>) -> Result<KnowledgeCategories> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|err| match to_domain(err) {
        SlotwiseError::NotFound(_) => {
            SlotwiseError::NotFound(format!("Knowledge file {}", path.display()))
        }
        other => other,
    })?;

    let format = KnowledgeFormat::from_path(path);
    let categories = format.parse(&content)?;
    let pairs: usize = categories.values().map(Vec::len).sum();
    if pairs == 0 {
        return Err(SlotwiseError::InvalidInput(format!(
            "No question/answer pairs found in {}",
            path.display()
        )));
    }

    info!(
        path = %path.display(),
        ?format,
        categories = categories.len(),
        pairs,
        "Loaded knowledge file"
    );
    Ok(categories)
}
