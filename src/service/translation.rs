use crate::error::CinkbertError;
use crate::providers::openai::OpenaiClient;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    #[serde(default)]
    pub trigger_word: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub translated_text: String,
    pub original_text: String,
    pub was_translated: bool,
}

impl TranslationResult {
    fn passthrough(text: &str) -> Self {
        Self {
            translated_text: text.to_string(),
            original_text: text.to_string(),
            was_translated: false,
        }
    }
}

/// Translates `text` to English when it is written in the configured source language.
///
/// Two chat calls: a yes/no language check, then the translation itself.
pub async fn translate_prompt(
    openai: &OpenaiClient,
    text: &str,
    trigger_word: Option<&str>,
) -> Result<TranslationResult, CinkbertError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CinkbertError::invalid_request("Text to translate is empty."));
    }
    let language = openai.config().source_language.as_str();

    let answer = openai
        .chat(&detection_instructions(language), &format!("Text: \"{text}\""))
        .await?;
    if !is_affirmative(&answer) {
        return Ok(TranslationResult::passthrough(text));
    }

    let trigger_word = trigger_word.map(str::trim).filter(|w| !w.is_empty());
    let translated = openai
        .chat(
            &translation_instructions(language),
            &translation_message(text, trigger_word),
        )
        .await?;

    info!(
        language,
        original_chars = text.chars().count(),
        translated_chars = translated.chars().count(),
        "Prompt translated"
    );
    Ok(TranslationResult {
        translated_text: translated,
        original_text: text.to_string(),
        was_translated: true,
    })
}

fn detection_instructions(language: &str) -> String {
    format!(
        "Decide whether the user's text is written in {language}. \
         Answer with exactly one word: true or false."
    )
}

fn translation_instructions(language: &str) -> String {
    format!(
        "You translate image-generation prompts from {language} to English. \
         Translate faithfully and reply with the translation only. \
         Text inside quotation marks stays untranslated."
    )
}

fn translation_message(text: &str, trigger_word: Option<&str>) -> String {
    match trigger_word {
        Some(word) => format!(
            "Translate this prompt to English and keep the keyword \"{word}\" exactly as written: {text}"
        ),
        None => format!("Translate this prompt to English: {text}"),
    }
}

/// Accepts `true`, `True.`, `"true"` and similar; everything else counts as no.
fn is_affirmative(answer: &str) -> bool {
    answer
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .eq_ignore_ascii_case("true")
}
