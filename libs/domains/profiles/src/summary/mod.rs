mod generator;
mod openai;
mod prompt;

pub use generator::SummaryGenerator;
pub use openai::OpenAISummaryGenerator;
pub use prompt::{format_profile, summary_prompt};

#[cfg(test)]
pub use generator::MockSummaryGenerator;
