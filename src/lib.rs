pub mod advisor;
pub mod analysis;
pub mod answers;
pub mod app;
pub mod cli;
pub mod dashboard;
pub mod documents;
pub mod editor;
pub mod features;
pub mod llm;
pub mod models;
pub mod report;
pub mod scoring;
pub mod store;
pub mod utils;

#[cfg(test)]
pub mod test_utils;
