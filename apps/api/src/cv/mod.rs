// CV pipeline: parse uploads, score them against a job description, rewrite them.

pub mod handlers;
pub mod jd_parser;
pub mod match_scoring;
pub mod models;
pub mod optimizer;
pub mod parser;
pub mod prompts;
pub mod upload;
