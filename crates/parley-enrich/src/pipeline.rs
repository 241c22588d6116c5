//! Keyword → fact + news lookup pipeline.

use parley_core::NewsItem;
use tracing::{debug, instrument};

use crate::errors::EnrichError;
use crate::fact::FactSource;
use crate::keyword::KeywordExtractor;
use crate::news::NewsSource;

/// The material gathered for one topic change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Enrichment {
    /// One-sentence fact, when the keyword had a page.
    pub fact: Option<String>,
    /// Recent headlines, already truncated to the configured maximum.
    pub news: Vec<NewsItem>,
}

impl Enrichment {
    /// Whether the lookup produced anything worth relaying.
    pub fn is_empty(&self) -> bool {
        self.fact.is_none() && self.news.is_empty()
    }
}

/// Run the full lookup for one utterance: extract the keyword, then fetch
/// fact and news concurrently.
///
/// `Ok(None)` means the utterance had no lookup keyword — enrichment ends
/// quietly. A fact or news failure degrades that half to empty rather than
/// failing the lookup; only keyword extraction failure is an error.
#[instrument(skip_all, fields(text_len = text.len()))]
pub async fn lookup(
    keywords: &dyn KeywordExtractor,
    facts: &dyn FactSource,
    news: &dyn NewsSource,
    text: &str,
) -> Result<Option<Enrichment>, EnrichError> {
    let Some(keyword) = keywords.keyword(text).await? else {
        debug!("no lookup keyword in utterance");
        return Ok(None);
    };
    debug!(keyword = %keyword, "keyword extracted");

    let (fact, headlines) = tokio::join!(facts.fact(&keyword), news.headlines(&keyword));

    let fact = match fact {
        Ok(f) => f,
        Err(e) => {
            debug!(error = %e, "fact lookup failed, continuing without");
            None
        }
    };
    let news = match headlines {
        Ok(items) => items,
        Err(e) => {
            debug!(error = %e, "news lookup failed, continuing without");
            Vec::new()
        }
    };

    Ok(Some(Enrichment { fact, news }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
