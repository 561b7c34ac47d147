pub mod chain;
pub mod llm;
pub mod template;
