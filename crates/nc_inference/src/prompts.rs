//! Prompt templates and response parsing shared by the chat-backed models.

use nc_core::TitledSummary;

const SUMMARY_MARKER: &str = "Summary:";
const TITLE_MARKER: &str = "Title:";

pub fn summary_prompt(text: &str) -> String {
    format!(
        "You are an expert summarizer. Your task is to create a clear and concise summary of the following text.\n\
         \n\
         Guidelines:\n\
         - The summary should not exceed 3 sentences.\n\
         - Focus on the main ideas and omit unnecessary details.\n\
         - Avoid repetition and redundancy.\n\
         - Make sure the summary is in fluent and grammatically correct English.\n\
         \n\
         Text:\n\
         {}\n\
         \n\
         Summary:",
        text
    )
}

pub fn summary_and_title_prompt(text: &str) -> String {
    format!(
        "You are a professional summarizer. Analyze the following text and perform the following tasks:\n\
         \n\
         1. Generate a concise summary of no more than 2-3 sentences.\n\
         2. Propose a title that represents the topic discussed in the text.\n\
         \n\
         Text:\n\
         {}\n\
         \n\
         Provide your response in the following format:\n\
         Summary: <summary>\n\
         Title: <title>",
        text
    )
}

/// Parse a `Summary: ... Title: ...` response. Both fields are `None` unless
/// both markers are present with the summary first.
pub fn parse_summary_and_title(response: &str) -> TitledSummary {
    let Some((_, after_summary)) = response.split_once(SUMMARY_MARKER) else {
        return TitledSummary::default();
    };
    let Some((summary, title)) = after_summary.split_once(TITLE_MARKER) else {
        return TitledSummary::default();
    };

    TitledSummary {
        title: non_empty(title),
        summary: non_empty(summary),
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_response() {
        let parsed = parse_summary_and_title(
            "Summary: Rates rose again. Markets fell.\nTitle: Central bank tightens",
        );
        assert_eq!(parsed, TitledSummary::new("Central bank tightens", "Rates rose again. Markets fell."));
    }

    #[test]
    fn test_parse_ignores_preamble() {
        let parsed = parse_summary_and_title("Sure! Here it is.\n\nSummary: A storm.\nTitle: Weather");
        assert_eq!(parsed.title.as_deref(), Some("Weather"));
        assert_eq!(parsed.summary.as_deref(), Some("A storm."));
    }

    #[test]
    fn test_parse_missing_marker_yields_nothing() {
        assert_eq!(parse_summary_and_title("Summary: only a summary"), TitledSummary::default());
        assert_eq!(parse_summary_and_title("Title: only a title"), TitledSummary::default());
        assert_eq!(parse_summary_and_title("Title: T\nSummary: S"), TitledSummary::default());
        assert_eq!(parse_summary_and_title(""), TitledSummary::default());
    }

    #[test]
    fn test_parse_blank_field_is_missing() {
        let parsed = parse_summary_and_title("Summary:   \nTitle: Something");
        assert_eq!(parsed.summary, None);
        assert_eq!(parsed.title.as_deref(), Some("Something"));
    }

    #[test]
    fn test_prompts_embed_text() {
        assert!(summary_prompt("BODY").contains("BODY"));
        assert!(summary_prompt("x").contains("3 sentences"));
        let prompt = summary_and_title_prompt("CLUSTER");
        assert!(prompt.contains("CLUSTER"));
        assert!(prompt.ends_with("Title: <title>"));
    }
}
