use crate::enricher::{TextEnricher, TRANSLATION_FALLBACK};
use crate::llm_adapter::CompletionBackend;
use crate::types::{
    translation_key, EnrichedPost, EnrichmentOptions, RawPost, TAG_OPTIONS, UNCATEGORIZED,
    UNTITLED_POEM,
};
use crate::utils::text::{strip_hashtags, title_case};
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct EnrichmentReport {
    pub posts: Vec<EnrichedPost>,
    /// Posts dropped for having no content.
    pub skipped: usize,
}

/// Runs posts one at a time through grammar, title, translation and tagging.
pub struct EnrichmentPipeline<B> {
    enricher: TextEnricher<B>,
    options: EnrichmentOptions,
}

impl<B: CompletionBackend> EnrichmentPipeline<B> {
    pub fn new(enricher: TextEnricher<B>, options: EnrichmentOptions) -> Self {
        Self { enricher, options }
    }

    pub async fn run(&self, posts: Vec<RawPost>) -> EnrichmentReport {
        let total = posts.len();
        let mut report = EnrichmentReport::default();

        for (index, post) in posts.into_iter().enumerate() {
            debug!(index, uri = %post.uri, "Enriching post");
            match self.enrich_post(post).await {
                Some(enriched) => report.posts.push(enriched),
                None => report.skipped += 1,
            }
        }

        info!(
            processed = report.posts.len(),
            skipped = report.skipped,
            total,
            "Enrichment finished"
        );
        report
    }

    /// `None` when the post has nothing to enrich.
    pub async fn enrich_post(&self, post: RawPost) -> Option<EnrichedPost> {
        if !post.has_content() {
            info!(uri = %post.uri, "Post has no content, skipping");
            return None;
        }

        let poem_en = self
            .enricher
            .fix_grammar(&strip_hashtags(&post.content))
            .await;

        let title_en = self.title_for(&post, &poem_en).await;

        let mut translations = BTreeMap::new();
        if self.options.enable_translation {
            let language = self.options.language.as_str();

            let title = match self.enricher.try_translate(&title_en, language, true).await {
                Some(translated) => title_case(&translated),
                None => TRANSLATION_FALLBACK.to_string(),
            };
            let poem = self.enricher.translate(&poem_en, language, false).await;

            translations.insert(translation_key("title", language), title);
            translations.insert(translation_key("poem", language), poem);
        }

        let tags = if self.options.enable_tagging {
            self.enricher.classify_tags(&poem_en, &TAG_OPTIONS).await
        } else {
            Vec::new()
        };

        let RawPost {
            content,
            published_at,
            uri,
            cid,
            title,
            category,
            mut extra,
            ..
        } = post;

        // Fields this record owns must not be echoed from the input, whether
        // or not this run produced them.
        extra.remove("poem_en");
        for field in ["title", "poem"] {
            extra.remove(&translation_key(field, &self.options.language));
        }

        Some(EnrichedPost {
            content,
            published_at,
            uri,
            cid,
            title,
            poem_en,
            title_en,
            translations,
            tags,
            category: category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            extra,
        })
    }

    async fn title_for(&self, post: &RawPost, poem_en: &str) -> String {
        let existing = post.existing_title();

        if self.options.enable_title {
            let title = match existing {
                Some(title) => self.enricher.fix_grammar(&strip_hashtags(title)).await,
                None => self.enricher.generate_title(poem_en).await,
            };
            return title_case(&title);
        }

        match existing {
            Some(title) => title_case(&strip_hashtags(title)),
            None => UNTITLED_POEM.to_string(),
        }
    }
}
