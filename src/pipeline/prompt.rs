//! Prompt construction for the three operations.

use crate::types::{ConversationTurn, FeedbackRecord};

/// Number each record as `[Example N]` so answers can cite them.
pub fn format_context(records: &[FeedbackRecord]) -> String {
    if records.is_empty() {
        return "No customer feedback was found for this period.".to_string();
    }
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let mut line = format!("[Example {}] {}", i + 1, record.text().trim());
            if let Some(place) = record.place_name() {
                line.push_str(&format!(" (location: {place})"));
            }
            if let Some(platform) = &record.metadata.source_platform {
                line.push_str(&format!(" (source: {platform})"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The most recent `limit` turns, oldest first.
pub fn recent_turns(history: &[ConversationTurn], limit: usize) -> &[ConversationTurn] {
    &history[history.len().saturating_sub(limit)..]
}

pub fn format_history(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn marker_prompt(query: &str, records: &[FeedbackRecord]) -> String {
    format!(
        "You are analyzing customer feedback for a mobile carrier.\n\n\
         Customer feedback:\n{context}\n\n\
         Task: list the locations that the feedback above associates with \"{query}\".\n\
         Only include places that appear in the feedback. Do not invent locations.\n\
         Respond with a JSON array and nothing else, in this format:\n\
         [{{\"name\": \"City, Region\", \"coordinates\": [longitude, latitude]}}]",
        context = format_context(records),
    )
}

pub fn chat_prompt(
    message: &str,
    history: &[ConversationTurn],
    history_turns: usize,
    records: &[FeedbackRecord],
) -> String {
    let turns = recent_turns(history, history_turns);
    let conversation = if turns.is_empty() {
        "(no previous messages)".to_string()
    } else {
        format_history(turns)
    };
    format!(
        "You are a customer sentiment analyst answering questions about customer feedback.\n\n\
         Conversation so far:\n{conversation}\n\n\
         Relevant customer feedback:\n{context}\n\n\
         Question: {message}\n\n\
         Instructions:\n\
         - Start with a short direct answer, then give supporting bullet points.\n\
         - Keep the whole answer between 50 and 150 words.\n\
         - Cite the examples you rely on by number, e.g. [Example 3].\n\
         - If the feedback does not answer the question, say so.",
        context = format_context(records),
    )
}

pub fn metrics_prompt(records: &[FeedbackRecord]) -> String {
    format!(
        "You are computing dashboard metrics from customer feedback.\n\n\
         Customer feedback:\n{context}\n\n\
         Estimate these six metrics from the feedback: happinessIndex (0-100), \
         positiveSentiment, negativeSentiment and neutralSentiment (percentages), \
         responseTime (hours) and resolutionRate (percentage).\n\
         Each metric has a value, a change versus the previous period, and a trend of \
         \"up\", \"down\" or \"neutral\".\n\
         Respond with a single JSON object and nothing else, in this format:\n\
         {{\"happinessIndex\": {{\"value\": 0, \"change\": 0, \"trend\": \"neutral\"}}, \
         \"positiveSentiment\": {{...}}, \"negativeSentiment\": {{...}}, \
         \"neutralSentiment\": {{...}}, \"responseTime\": {{...}}, \"resolutionRate\": {{...}}}}",
        context = format_context(records),
    )
}
