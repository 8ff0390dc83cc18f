//! Backend node graph and contextual retrieval over interactive HTML elements.
//!
//! Markup is turned into a [`dom::NodeGraph`] keyed by externally assigned
//! node ids, and a [`retriever::ContextualRetriever`] ranks the interactive
//! nodes against a natural-language query.

pub mod config;
pub mod dom;
pub mod retriever;
#[cfg(test)]
mod tests;
