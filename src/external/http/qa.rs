use super::dto::MetricsAnswer;
use crate::external::Services;
use crate::result::{Error, Result};

const ORIGIN: &str = "metrics";

/// Sends one metrics question to the Q&A endpoint. The caller supplies a
/// fresh query id; the session/query pair is what feedback later refers to.
pub async fn ask_metrics_question(
    services: &Services,
    session_id: &str,
    query_id: &str,
    query: &str,
) -> Result<String> {
    let res = services
        .http
        .post(&services.settings.qa_endpoint)
        .header("X-Origin", ORIGIN)
        .header("X-API-Key", &services.settings.api_key)
        .header("X-Session-ID", session_id)
        .header("X-Query-ID", query_id)
        .json(&serde_json::json!({ "query": query }))
        .send()
        .await?;
    if !res.status().is_success() {
        return Err(Error::ErrorWithMessage(format!(
            "Q&A request failed: {}",
            res.status()
        )));
    }
    let answer: MetricsAnswer = res.json().await?;
    Ok(answer.response)
}

/// Reports whether an answer was helpful. Identity travels in headers; the
/// rating endpoint takes no body.
pub async fn send_metrics_feedback(
    services: &Services,
    session_id: &str,
    query_id: &str,
    positive: bool,
) -> Result<()> {
    let res = services
        .http
        .post(&services.settings.rating_endpoint)
        .header("X-Origin", ORIGIN)
        .header("X-API-Key", &services.settings.api_key)
        .header("X-Session-ID", session_id)
        .header("X-Query-ID", query_id)
        .header("X-Feedback", if positive { "1" } else { "0" })
        .send()
        .await?;
    if !res.status().is_success() {
        return Err(Error::ErrorWithMessage(format!(
            "Rating submission failed: {}",
            res.status()
        )));
    }
    Ok(())
}

/// Generates a fresh query identifier for one Q&A interaction.
pub fn generate_query_id() -> String {
    scru128::new_string()
}
