use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Prebuilt flat vector index
    pub index_path: PathBuf,
    /// JSON array of chunk metadata, one entry per index row
    pub metadata_path: PathBuf,
    /// Neighbours retrieved per question
    pub top_k: usize,
    /// Maximum accepted request body in bytes (base64 images are large)
    pub max_body_bytes: usize,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Tesseract configuration
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "ollama"
    pub provider: String,
    /// Base URL for the LLM API, without the `/v1/...` suffix
    pub base_url: String,
    /// Model name for answer generation
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// Bearer token (required for the openai provider)
    pub api_key: Option<String>,
    pub embed_timeout_secs: u64,
    pub chat_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract executable
    pub command: String,
    /// Optional `-l` language, e.g. "eng"
    pub lang: Option<String>,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            index_path: PathBuf::from("faiss.index"),
            metadata_path: PathBuf::from("chunk_metadata.json"),
            top_k: 5,
            max_body_bytes: 10 * 1024 * 1024,
            llm: LlmConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://aipipe.org/openai".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            api_key: None,
            embed_timeout_secs: 15,
            chat_timeout_secs: 30,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            lang: None,
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup. Values that fail to
    /// parse leave the default in place.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("COURSE_QA_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(path) = lookup("COURSE_QA_INDEX_PATH") {
            config.index_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("COURSE_QA_METADATA_PATH") {
            config.metadata_path = PathBuf::from(path);
        }
        if let Some(val) = lookup("COURSE_QA_TOP_K") {
            if let Ok(v) = val.parse::<usize>() {
                config.top_k = v.max(1);
            }
        }
        if let Some(val) = lookup("COURSE_QA_MAX_BODY_BYTES") {
            if let Ok(v) = val.parse() {
                config.max_body_bytes = v;
            }
        }

        // LLM config
        if let Some(provider) = lookup("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Some(model) = lookup("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_blank("AIPIPE_TOKEN").or_else(|| non_blank("LLM_API_KEY")) {
            config.llm.api_key = Some(key);
        }
        if let Some(val) = lookup("LLM_EMBED_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.llm.embed_timeout_secs = v;
            }
        }
        if let Some(val) = lookup("LLM_CHAT_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.llm.chat_timeout_secs = v;
            }
        }

        // OCR config
        if let Some(cmd) = lookup("TESSERACT_CMD") {
            config.ocr.command = cmd;
        }
        if let Some(lang) = lookup("OCR_LANG") {
            config.ocr.lang = Some(lang);
        }
        if let Some(val) = lookup("OCR_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.ocr.timeout_secs = v;
            }
        }

        match config.llm.provider.as_str() {
            "openai" => {
                if config.llm.api_key.is_none() {
                    anyhow::bail!("AIPIPE_TOKEN environment variable not set");
                }
            }
            "ollama" => {}
            other => anyhow::bail!("Unknown LLM provider: {other}"),
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_token() {
        let config = Config::from_lookup(lookup_from(&[("AIPIPE_TOKEN", "tok")])).unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.index_path, PathBuf::from("faiss.index"));
        assert_eq!(config.llm.chat_model, "gpt-3.5-turbo");
        assert_eq!(config.llm.embedding_model, "text-embedding-3-small");
        assert_eq!(config.llm.api_key.as_deref(), Some("tok"));
        assert_eq!(config.llm.embed_timeout(), Duration::from_secs(15));
        assert_eq!(config.llm.chat_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("AIPIPE_TOKEN"));
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        assert!(Config::from_lookup(lookup_from(&[("AIPIPE_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn test_ollama_needs_no_token() {
        let config = Config::from_lookup(lookup_from(&[
            ("LLM_PROVIDER", "ollama"),
            ("LLM_BASE_URL", "http://localhost:11434/"),
        ]))
        .unwrap();
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = Config::from_lookup(lookup_from(&[("LLM_PROVIDER", "bard")])).unwrap_err();
        assert!(err.to_string().contains("bard"));
    }

    #[test]
    fn test_llm_api_key_alias() {
        let config = Config::from_lookup(lookup_from(&[("LLM_API_KEY", "k2")])).unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("k2"));
    }

    #[test]
    fn test_blank_token_falls_back_to_alias() {
        let config = Config::from_lookup(lookup_from(&[
            ("AIPIPE_TOKEN", ""),
            ("LLM_API_KEY", "real"),
        ]))
        .unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("real"));
    }

    #[test]
    fn test_bad_numbers_keep_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("AIPIPE_TOKEN", "tok"),
            ("COURSE_QA_TOP_K", "many"),
            ("OCR_TIMEOUT_SECS", "-3"),
        ]))
        .unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.ocr.timeout_secs, 30);
    }

    #[test]
    fn test_top_k_floor_is_one() {
        let config = Config::from_lookup(lookup_from(&[
            ("AIPIPE_TOKEN", "tok"),
            ("COURSE_QA_TOP_K", "0"),
        ]))
        .unwrap();
        assert_eq!(config.top_k, 1);
    }
}
