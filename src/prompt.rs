//! Chat-context assembly for the external LLM collaborator.
//!
//! The engine does no natural-language work itself; it only serializes the
//! clinic's knowledge (profile, staff + weekly schedule + sessions, FAQ) into
//! the text block a hosted model receives alongside the visitor's question.

use serde_json::json;

use crate::model::{ClinicState, Faq};

/// FAQ entries flattened to `Q:`/`A:` lines, blank-line separated.
pub fn faq_text(faq: &[Faq]) -> String {
    faq.iter()
        .map(|f| format!("Q: {}\nA: {}", f.question, f.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Staff, weekly schedule, and session ledger as one JSON document.
pub fn staff_schedule_json(state: &ClinicState) -> serde_json::Value {
    json!({
        "staff": state.staff,
        "schedule": state.weekly_schedule,
        "sessions": state.sessions,
    })
}

/// The full prompt sent to the LLM collaborator for a clinic question.
pub fn clinic_prompt(state: &ClinicState, question: &str) -> String {
    let schedule = serde_json::to_string_pretty(&staff_schedule_json(state))
        .unwrap_or_else(|_| "{}".into());
    format!(
        "You are a helpful AI assistant for a clinic. Answer user questions \
         based on the provided information.\n\
         \n\
         CONTEXT:\n\
         - The clinic's name is {name}.\n\
         - Address: {address}\n\
         - Phone: {phone}\n\
         - Hours: {hours}\n\
         \n\
         STAFF & SCHEDULE JSON (weekday numbers: 0=Sunday .. 6=Saturday):\n\
         {schedule}\n\
         \n\
         FAQ:\n\
         {faq}\n\
         \n\
         If the question is about booking an appointment, answer: \"You can \
         book a session by going to our booking page: /book\"\n\
         \n\
         Question: {question}",
        name = state.info.name,
        address = state.info.address,
        phone = state.info.phone,
        hours = state.info.hours,
        schedule = schedule,
        faq = faq_text(&state.faq),
        question = question,
    )
}
