/// Lowercased, whitespace-split search terms. Duplicates are kept and count again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTerms(Vec<String>);

impl QueryTerms {
    pub fn parse(query: &str) -> Self {
        Self(query.to_lowercase().split_whitespace().map(str::to_string).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

const TITLE_WEIGHT: f64 = 3.0;
const CONTENT_WEIGHT: f64 = 1.0;

/// Weighted substring match count: 3 per term found in the title, 1 per term
/// found only in the content.
pub fn score(title: &str, content: &str, terms: &QueryTerms) -> f64 {
    let title = title.to_lowercase();
    let haystack = format!("{} {}", title, content.to_lowercase());

    terms
        .iter()
        .filter(|term| haystack.contains(term))
        .map(|term| {
            if title.contains(term) {
                TITLE_WEIGHT
            } else {
                CONTENT_WEIGHT
            }
        })
        .sum()
}
