use thiserror::Error;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::models::{ChainOutput, ChainResponse, PromptRequest};
use crate::services::llm::{CompletionError, CompletionService};
use crate::services::template::{PromptTemplate, TemplateError};

pub const TITLE_TEMPLATE: &str =
    "Search the Texas Penal Code for the definition, elements of offense, and punishment{topic}";
pub const SCRIPT_TEMPLATE: &str = "Texas Penal Code Title {title}";

/// Upper bound on how much stage-1 output is carried into stage 2.
pub const MAX_TITLE_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Title,
    Script,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Title => write!(f, "title"),
            Stage::Script => write!(f, "script"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("No prompt provided")]
    MissingInput,
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("{stage} stage failed: {source}")]
    Upstream {
        stage: Stage,
        #[source]
        source: CompletionError,
    },
}

/// Two-stage sequential chain: topic -> title -> script.
#[derive(Debug, Clone)]
pub struct PromptChain {
    title_template: PromptTemplate,
    script_template: PromptTemplate,
}

impl PromptChain {
    pub fn new() -> Result<Self, TemplateError> {
        Self::with_templates(TITLE_TEMPLATE, SCRIPT_TEMPLATE)
    }

    pub fn with_templates(title: &str, script: &str) -> Result<Self, TemplateError> {
        Ok(PromptChain {
            title_template: PromptTemplate::with_variables(title, &["topic"])?,
            script_template: PromptTemplate::with_variables(script, &["title"])?,
        })
    }

    /// Validates the request, runs both stages and applies the placeholder
    /// fallbacks to empty outputs.
    pub async fn handle(
        &self,
        llm: &dyn CompletionService,
        request: &PromptRequest,
    ) -> Result<ChainResponse, ChainError> {
        let topic = request.topic().ok_or(ChainError::MissingInput)?;
        let span = info_span!("prompt_chain", request_id = %Uuid::new_v4());
        let output = self.run(llm, topic).instrument(span).await?;
        Ok(ChainResponse::from(output))
    }

    pub async fn run(&self, llm: &dyn CompletionService, topic: &str) -> Result<ChainOutput, ChainError> {
        let title_prompt = self.title_template.format_one("topic", topic)?;
        debug!(prompt = %title_prompt, "Running title stage");
        let title = llm
            .complete(&title_prompt)
            .await
            .map_err(|source| upstream(Stage::Title, source))?;

        // Only the copy embedded in the next prompt is cleaned; the caller gets the raw title.
        let embedded_title = sanitize_completion(&title, MAX_TITLE_CHARS);
        if embedded_title.len() != title.len() {
            debug!(raw_len = title.len(), kept_len = embedded_title.len(), "Sanitized title for script stage");
        }

        let script_prompt = self.script_template.format_one("title", &embedded_title)?;
        debug!(prompt = %script_prompt, "Running script stage");
        let script = llm
            .complete(&script_prompt)
            .await
            .map_err(|source| upstream(Stage::Script, source))?;

        info!(title_len = title.len(), script_len = script.len(), "Prompt chain finished");
        Ok(ChainOutput { title, script })
    }
}

fn upstream(stage: Stage, source: CompletionError) -> ChainError {
    warn!(%stage, error = %source, "Completion call failed");
    ChainError::Upstream { stage, source }
}

/// Model output is untrusted before it goes into another prompt: control
/// characters become spaces, surrounding whitespace is dropped and the result
/// is cut to `max_chars` characters.
pub fn sanitize_completion(text: &str, max_chars: usize) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    cleaned.trim().chars().take(max_chars).collect::<String>().trim_end().to_string()
}
