use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::canned;
use crate::llm::chat::complete;
use crate::llm::embeddings::embed;
use crate::models::{AnswerResponse, AskRequest, ChatMessage, ChunkHit, Link};
use crate::ocr;
use crate::state::AppState;

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// POST /api/ - Answer a student question:
///   1. OCR the attached image, if any
///   2. Short-circuit known questions with a fixed answer
///   3. Embed question + OCR text and retrieve the nearest chunks
///   4. Ask the LLM to answer from those chunks
///   5. Return the answer with the chunks' source links
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AnswerResponse>, (StatusCode, String)> {
    let started = Instant::now();

    // ── Step 1: OCR ───────────────────────────────────────
    let ocr_text = match req.image.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(image) => ocr::extract_text(&state.config.ocr, image)
            .await
            .map_err(|e| {
                tracing::warn!("OCR failed: {e:#}");
                (
                    StatusCode::BAD_REQUEST,
                    format!("OCR processing failed: {e:#}"),
                )
            })?,
        None => String::new(),
    };
    let combined_text = combine_question(&req.question, &ocr_text);

    // ── Step 2: Canned answers ────────────────────────────
    if let Some(resp) = canned::lookup(&req.question) {
        tracing::info!("Answered from canned responses");
        return Ok(Json(resp));
    }

    if combined_text.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question is required".to_string()));
    }

    // ── Step 3: Retrieval ─────────────────────────────────
    let query_embedding = embed(&state.http_client, &state.config.llm, &combined_text)
        .await
        .map_err(|e| internal_error("Embedding", e))?;

    let hits = state
        .index
        .search(&query_embedding, state.config.top_k)
        .map_err(|e| internal_error("Search", e))?;
    tracing::info!(
        metric = ?state.index.metric(),
        top_score = hits.first().map(|h| h.score),
        "Retrieved {} chunks",
        hits.len()
    );

    // ── Step 4: Generation ────────────────────────────────
    let context = build_context(&hits);
    let messages = build_messages(&req.question, &context);
    let answer = complete(&state.http_client, &state.config.llm, &messages)
        .await
        .map_err(|e| internal_error("Generation", e))?;

    // ── Step 5: Links ─────────────────────────────────────
    let links = source_links(&hits);
    tracing::info!(
        links = links.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Answered from retrieval"
    );

    Ok(Json(AnswerResponse { answer, links }))
}

fn internal_error(stage: &str, e: anyhow::Error) -> (StatusCode, String) {
    tracing::error!("{stage} failed: {e:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
}

// ─── Helper functions ────────────────────────────────────

fn combine_question(question: &str, ocr_text: &str) -> String {
    if ocr_text.trim().is_empty() {
        question.to_string()
    } else {
        format!("{question}\n\n{ocr_text}")
    }
}

fn build_context(hits: &[ChunkHit]) -> String {
    hits.iter()
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

fn build_system_prompt() -> &'static str {
    "You are a helpful virtual teaching assistant for the Tools in Data Science course. \
     Follow the student's instructions exactly. If the question mentions a specific model to use, \
     confirm using that model (e.g. GPT-3.5-Turbo-0125). \
     If the question involves scoring or bonuses, compute them literally. \
     If the question is about containerization, recommend Podman and note that Docker is also acceptable. \
     If the exam date is unknown, say it is not available yet. \
     Answer clearly and concisely, with any relevant links."
}

fn build_user_prompt(question: &str, context: &str) -> String {
    format!(
        "Student Question:\n{question}\n\n\
         Use the following course/forum content to answer:\n{context}\n\n\
         Provide the best possible answer based ONLY on the context above."
    )
}

fn build_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(build_system_prompt().trim()),
        ChatMessage::user(build_user_prompt(question, context).trim()),
    ]
}

/// Links for hits whose source is an http(s) URL, in rank order.
fn source_links(hits: &[ChunkHit]) -> Vec<Link> {
    hits.iter()
        .filter_map(|h| {
            let url = h.source.as_deref().unwrap_or_default();
            if url.is_empty() || !url.starts_with("http") {
                return None;
            }
            let text = h
                .title
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or("Source");
            Some(Link {
                url: url.to_string(),
                text: text.to_string(),
            })
        })
        .collect()
}
