// Resume analysis: prompt templates, the operation catalog, and the pipeline
// that dispatches rendered prompts to the model client.
// All model calls go through llm_client; no direct provider calls here.

pub mod catalog;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod session;
pub mod template;
