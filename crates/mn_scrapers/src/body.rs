use mn_core::BodyStrategy;

/// Picks the article body out of the page's paragraph texts.
pub trait BodyExtractor: Send + Sync {
    /// Name shown in logs
    fn name(&self) -> &str;

    /// `None` when there is nothing to pick from
    fn extract(&self, paragraphs: &[String]) -> Option<String>;
}

/// The paragraph with the most characters; the first one wins a tie.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongestParagraph;

impl BodyExtractor for LongestParagraph {
    fn name(&self) -> &str {
        "longest-paragraph"
    }

    fn extract(&self, paragraphs: &[String]) -> Option<String> {
        let mut best: Option<(&String, usize)> = None;
        for paragraph in paragraphs {
            let len = paragraph.chars().count();
            if best.map_or(true, |(_, best_len)| len > best_len) {
                best = Some((paragraph, len));
            }
        }
        best.map(|(paragraph, _)| paragraph.clone())
    }
}

/// Every non-blank paragraph, trimmed and separated by a blank line.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinedParagraphs;

impl BodyExtractor for JoinedParagraphs {
    fn name(&self) -> &str {
        "joined-paragraphs"
    }

    fn extract(&self, paragraphs: &[String]) -> Option<String> {
        let joined = paragraphs
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        (!joined.is_empty()).then_some(joined)
    }
}

pub fn body_extractor(strategy: BodyStrategy) -> Box<dyn BodyExtractor> {
    match strategy {
        BodyStrategy::Longest => Box::new(LongestParagraph),
        BodyStrategy::Joined => Box::new(JoinedParagraphs),
    }
}
