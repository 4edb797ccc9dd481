use serde::{Deserialize, Serialize};

/// Metadata for one indexed chunk, parallel to the vector index rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// A retrieved chunk with its rank score
#[derive(Debug, Clone)]
pub struct ChunkHit {
    pub row: usize,
    pub text: String,
    pub source: Option<String>,
    pub title: Option<String>,
    /// Squared L2 distance or inner product, depending on the index metric
    pub score: f32,
}

/// Question request
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
    /// Base64-encoded image
    #[serde(default)]
    pub image: Option<String>,
}

/// Answer response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub text: String,
}

/// A single chat turn sent to the completion API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub chunks: usize,
    pub dimension: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_request_image_optional() {
        let req: AskRequest = serde_json::from_str(r#"{"question":"hi"}"#).unwrap();
        assert_eq!(req.question, "hi");
        assert!(req.image.is_none());

        let req: AskRequest =
            serde_json::from_str(r#"{"question":"hi","image":null}"#).unwrap();
        assert!(req.image.is_none());
    }

    #[test]
    fn test_ask_request_requires_question() {
        assert!(serde_json::from_str::<AskRequest>(r#"{"image":"abc"}"#).is_err());
    }

    #[test]
    fn test_metadata_tolerates_missing_and_extra_fields() {
        let md: ChunkMetadata =
            serde_json::from_str(r#"{"text":"t","chunk_id":7,"source":null}"#).unwrap();
        assert_eq!(md.text, "t");
        assert!(md.source.is_none());
        assert!(md.title.is_none());
    }

    #[test]
    fn test_answer_response_shape() {
        let resp = AnswerResponse {
            answer: "110".into(),
            links: vec![],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, serde_json::json!({ "answer": "110", "links": [] }));
    }
}
