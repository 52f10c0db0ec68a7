pub mod image;
pub mod llm;
pub mod safety;
pub mod script;
pub mod setup;
pub mod workflow;
