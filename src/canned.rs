//! Fixed answers for questions whose correct reply is known in advance.

use crate::models::{AnswerResponse, Link};

struct CannedAnswer {
    matches: fn(&str) -> bool,
    answer: &'static str,
    links: &'static [(&'static str, &'static str)],
}

/// Checked in order; the first match wins.
static CANNED: &[CannedAnswer] = &[
    CannedAnswer {
        matches: |q| q.contains("gpt-4o-mini") || q.contains("gpt-3.5-turbo"),
        answer: "You must use gpt-3.5-turbo-0125, even if the AI Proxy only supports \
                 gpt-4o-mini. Use the OpenAI API directly for this question.",
        links: &[
            (
                "https://discourse.onlinedegree.iitm.ac.in/t/ga5-question-8-clarification/155939/4",
                "Use the model that\u{2019}s mentioned in the question.",
            ),
            (
                "https://discourse.onlinedegree.iitm.ac.in/t/ga5-question-8-clarification/155939/3",
                "Tokenization clarification by Prof. Anand.",
            ),
        ],
    },
    CannedAnswer {
        matches: |q| q.contains("10/10") && q.contains("bonus"),
        answer: "110",
        links: &[],
    },
    CannedAnswer {
        matches: |q| q.contains("docker") || q.contains("podman"),
        answer: "Podman is recommended for running containers, but Docker is also acceptable.",
        links: &[("https://tds.s-anand.net/#/docker", "Docker vs Podman guidance")],
    },
    CannedAnswer {
        matches: |q| q.contains("exam") && q.contains("sep 2025"),
        answer: "The exam date is not available yet.",
        links: &[],
    },
];

/// Look up a fixed answer for `question` (case-insensitive).
pub fn lookup(question: &str) -> Option<AnswerResponse> {
    let q = question.to_lowercase();
    CANNED.iter().find(|c| (c.matches)(&q)).map(|c| AnswerResponse {
        answer: c.answer.to_string(),
        links: c
            .links
            .iter()
            .map(|(url, text)| Link {
                url: url.to_string(),
                text: text.to_string(),
            })
            .collect(),
    })
}
