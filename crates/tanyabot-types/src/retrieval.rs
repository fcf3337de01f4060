//! Retrieval types: passages returned by the external vector search.

use serde::{Deserialize, Serialize};

/// One reference passage returned by the vector search service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub content: String,
    pub similarity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passage_deserialize_from_search_payload() {
        let json = r#"{"content": "Plants use sunlight to make food.", "similarity": 0.91}"#;
        let passage: RetrievedPassage = serde_json::from_str(json).unwrap();
        assert_eq!(passage.content, "Plants use sunlight to make food.");
        assert!((passage.similarity - 0.91).abs() < f32::EPSILON);
    }
}
