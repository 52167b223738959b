use crate::config::toml_config::FilterConfig;

/// 轉成 " word word " 形式，用整字比對避免 "lpn" 命中其他字
fn keyword_haystack(text: &str) -> String {
    let words: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    format!(" {} ", words.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relevance {
    Relevant,
    NoKeyword,
    Excluded(String),
}

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl RelevanceFilter {
    pub fn new(config: &FilterConfig) -> Self {
        let prepare = |keywords: &[String]| {
            keywords
                .iter()
                .map(|k| keyword_haystack(k))
                .filter(|k| !k.trim().is_empty())
                .collect::<Vec<_>>()
        };

        Self {
            include: prepare(&config.include_keywords),
            exclude: prepare(&config.exclude_keywords),
        }
    }

    pub fn check(&self, title: &str, description: &str) -> Relevance {
        let title_words = keyword_haystack(title);

        if let Some(hit) = self.exclude.iter().find(|k| title_words.contains(k.as_str())) {
            return Relevance::Excluded(hit.trim().to_string());
        }

        if self.include.iter().any(|k| title_words.contains(k.as_str())) {
            return Relevance::Relevant;
        }

        let description_words = keyword_haystack(description);
        if self
            .include
            .iter()
            .any(|k| description_words.contains(k.as_str()))
        {
            Relevance::Relevant
        } else {
            Relevance::NoKeyword
        }
    }
}
