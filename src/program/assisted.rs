//! Model-assisted extraction for program pages no parser understands

use rig::agent::Agent;
use rig::completion::Completion as _;
use rig::completion::CompletionModel;
use rig::message::AssistantContent;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use super::Talk;
use super::error::ExtractError;
use crate::crawler::content_extraction::resolve_link;

/// Instruction sent ahead of the page content
pub const INSTRUCTION: &str = "You extract conference talks from the HTML of a program page. \
Answer with a JSON array only, no prose and no code fences. \
Each element must be an object with the string fields \"author\", \"title\" and \"link\". \
Use an empty string when a field is unknown. \
Answer with [] when the page lists no talks.";

/// A talk as returned by the model; every field may be absent
#[derive(Debug, Default, Deserialize)]
struct AssistedTalk {
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

/// Build the user prompt carrying the truncated page content
pub fn build_prompt(content: &str) -> String {
    format!("Program page HTML:\n\n{}", content)
}

/// Decode the model's answer, rejecting anything but a JSON array of objects
pub fn parse_response(
    raw: &str,
    base_url: &Url,
    year: &str,
    event: &str,
) -> Result<Vec<Talk>, ExtractError> {
    let records: Vec<AssistedTalk> =
        serde_json::from_str(raw.trim()).map_err(|source| ExtractError::MalformedResponse {
            raw: raw.to_string(),
            source,
        })?;

    Ok(records
        .into_iter()
        .map(|record| {
            let link = record
                .link
                .map(|link| link.trim().to_string())
                .filter(|link| !link.is_empty())
                .and_then(|link| resolve_link(base_url, &link));
            Talk {
                year: year.to_string(),
                event: event.to_string(),
                author: record.author.unwrap_or_default().trim().to_string(),
                title: record.title.unwrap_or_default().trim().to_string(),
                link,
            }
        })
        .collect())
}

/// Ask the model about a page and return its text answer
#[instrument(name = "assisted_completion", skip_all, fields(prompt_len = prompt.len()))]
pub async fn request_completion<M>(agent: &Agent<M>, prompt: &str) -> Result<String, ExtractError>
where
    M: CompletionModel,
{
    let response = agent.completion(prompt, vec![]).await?.send().await?;

    let text = response
        .choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text.clone()),
            other => {
                warn!(?other, "Ignoring non-text content from the model");
                None
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    debug!("Model answered with {} characters", text.len());
    Ok(text)
}
