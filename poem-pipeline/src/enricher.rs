use crate::llm_adapter::CompletionBackend;
use crate::retry::RetryingCaller;
use crate::types::UNTITLED_POEM;
use crate::utils::text::{strip_hashtags, strip_punctuation, strip_surrounding_quotes};
use tracing::debug;

pub const TRANSLATION_FALLBACK: &str = "tbd";
pub const MAX_TAGS: usize = 5;

/// The four model-backed text operations. Every operation returns a usable
/// value: the model's answer when there is one, otherwise a fixed fallback.
pub struct TextEnricher<B> {
    caller: RetryingCaller<B>,
}

impl<B: CompletionBackend> TextEnricher<B> {
    pub fn new(caller: RetryingCaller<B>) -> Self {
        Self { caller }
    }

    /// Fix capitalization and punctuation without touching the words. Falls
    /// back to the (hashtag-free) input.
    pub async fn fix_grammar(&self, text: &str) -> String {
        let text = strip_hashtags(text);
        let system_prompt = "You are a helpful assistant that corrects capitalization and punctuation in English text. \
             Do not change the words, only fix the grammar.";

        self.caller
            .call("Grammar Fix", system_prompt, &text)
            .await
            .unwrap_or(text)
    }

    pub async fn generate_title(&self, poem_text: &str) -> String {
        let poem_text = strip_hashtags(poem_text);
        let system_prompt = "You are a creative poetry title generator. Create simple, clever, and memorable titles for poems.";
        let user_prompt = format!(
            "Create a short, engaging title for this poem. The title should:\n\
             1. Be concise (1-5 words)\n\
             2. Use alliteration if possible\n\
             3. Capture the essence or main emotion\n\
             4. Not use hashtags or special characters\n\n\
             Poem:\n{}\n\n\
             Return ONLY the title, nothing else.",
            poem_text
        );

        self.caller
            .call("Title Generation", system_prompt, &user_prompt)
            .await
            .map(|title| strip_punctuation(&title))
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| UNTITLED_POEM.to_string())
    }

    /// Translation, or `None` when the model gave nothing usable.
    pub async fn try_translate(
        &self,
        text: &str,
        language: &str,
        is_title: bool,
    ) -> Option<String> {
        let text = strip_hashtags(text);
        let (system_prompt, user_prompt, context) = if is_title {
            (
                format!("You are a highly skilled translator of English text to {}.", language),
                format!(
                    "Directly translate this English poetry title to {} and return ONLY the translation, \
                     nothing else. No quotes, explanations, or arrows. Title: '{}'",
                    language, text
                ),
                format!("Title Translation => {}", language),
            )
        } else {
            (
                format!("You are a highly skilled translator of English poetry to {}.", language),
                format!(
                    "Translate thoughtfully, considering the poem's context, style, and intention. \
                     Capture the essence and feeling of the poem. Source:\n{}",
                    text
                ),
                format!("Poem Translation => {}", language),
            )
        };

        self.caller
            .call(&context, &system_prompt, &user_prompt)
            .await
            .map(|answer| strip_surrounding_quotes(&answer))
            .filter(|answer| !answer.is_empty())
    }

    pub async fn translate(&self, text: &str, language: &str, is_title: bool) -> String {
        self.try_translate(text, language, is_title)
            .await
            .unwrap_or_else(|| TRANSLATION_FALLBACK.to_string())
    }

    /// Up to five labels from `vocabulary`, in the order the model gave them.
    pub async fn classify_tags(&self, text: &str, vocabulary: &[&str]) -> Vec<String> {
        let text = strip_hashtags(text);
        let system_prompt = format!(
            "You are an expert in poetry analysis. Analyze the following poem and select up to 5 tags \
             that best describe it from this list: {}. \
             Provide only the tags as a comma-separated list, in lowercase.",
            vocabulary.join(", ")
        );

        match self.caller.call("Tagging", &system_prompt, &text).await {
            Some(answer) => validate_tags(&answer, vocabulary),
            None => Vec::new(),
        }
    }
}

/// Split a comma-separated answer, keep the first five entries, and drop
/// anything outside the vocabulary.
pub fn validate_tags(answer: &str, vocabulary: &[&str]) -> Vec<String> {
    let tags: Vec<String> = answer
        .split(',')
        .map(|tag| tag.trim().to_lowercase())
        .take(MAX_TAGS)
        .filter(|tag| vocabulary.contains(&tag.as_str()))
        .collect();
    debug!(answer, ?tags, "Validated tags");
    tags
}
