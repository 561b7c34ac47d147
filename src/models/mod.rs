use serde::{Deserialize, Serialize};

pub const NO_TITLE_FALLBACK: &str = "No title generated";
pub const NO_SCRIPT_FALLBACK: &str = "No script generated";

/// Body of `POST /`.
#[derive(Debug, Default, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl PromptRequest {
    /// Reads `prompt` from a JSON object body. Bodies that are not an object
    /// with a string `prompt` yield a request without one.
    pub fn from_body(body: &[u8]) -> Self {
        let prompt = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .as_ref()
            .and_then(|value| value.as_object())
            .and_then(|object| object.get("prompt"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        PromptRequest { prompt }
    }

    /// The topic text, if one was supplied and is non-empty.
    pub fn topic(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|prompt| !prompt.is_empty())
    }
}

/// Raw outputs of the two chain stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutput {
    pub title: String,
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainResponse {
    pub title: String,
    pub script: String,
}

impl From<ChainOutput> for ChainResponse {
    fn from(output: ChainOutput) -> Self {
        ChainResponse {
            title: or_fallback(output.title, NO_TITLE_FALLBACK),
            script: or_fallback(output.script, NO_SCRIPT_FALLBACK),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Blank outputs, including whitespace-only ones, are replaced for both fields alike.
fn or_fallback(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
