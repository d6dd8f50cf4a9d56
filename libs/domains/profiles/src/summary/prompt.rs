use crate::models::Profile;

pub const SYSTEM_MESSAGE: &str =
    "You are a helpful assistant that creates friendly, concise profile summaries.";

/// Render the structured fields of a profile as a bullet block.
///
/// The support line is left out entirely when `support` is empty.
pub fn format_profile(profile: &Profile) -> String {
    let mut lines = vec![
        format!("- Name: {}", profile.name),
        format!("- School: {}", profile.school),
        format!("- Location: {}", profile.location),
        format!("- Experience: {}", profile.experience),
        format!("- Interests: {}", profile.interests.join(", ")),
        format!("- Looking For: {}", profile.looking_for),
    ];

    if !profile.support.is_empty() {
        lines.push(format!("- Support Offered: {}", profile.support));
    }

    lines.join("\n")
}

/// User message asking for a 75–100 word attendee summary.
pub fn summary_prompt(profile: &Profile) -> String {
    format!(
        "Below is a profile of an attendee. Write a friendly, concise 75–100 word summary of \
         them that could help someone get a sense of who they are, their interests, what they \
         can help with, what they're looking for. Be structured and don't miss key details.\n\
         {}\nSummary:",
        format_profile(profile)
    )
}
