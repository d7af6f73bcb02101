use itertools::Itertools;
use mercury_core::Article;
use std::cmp::Ordering;

/// Best first: score, then most recently discovered, then lowest id.
pub fn rank_order(a: &Article, b: &Article) -> Ordering {
    b.relevance_score
        .total_cmp(&a.relevance_score)
        .then_with(|| b.discovered_date.cmp(&a.discovered_date))
        .then_with(|| a.story_id.cmp(&b.story_id))
}

/// Concatenate batches in order, keep the first copy of each story id,
/// rank and truncate.
pub fn merge_ranked(batches: Vec<Vec<Article>>, max_results: usize) -> Vec<Article> {
    let mut merged: Vec<Article> = batches
        .into_iter()
        .flatten()
        .unique_by(|article| article.story_id)
        .collect();
    merged.sort_by(rank_order);
    merged.truncate(max_results);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use mercury_core::DiscoveryMethod;

    fn article(story_id: i64, score: f64, method: DiscoveryMethod) -> Article {
        Article::new(story_id, "t", "u", "c", "illawarra_mercury", method).with_score(score)
    }

    #[test]
    fn test_dedup_keeps_first_batch() {
        let merged = merge_ranked(
            vec![
                vec![article(1, 3.0, DiscoveryMethod::SystematicBacktrack)],
                vec![article(1, 6.0, DiscoveryMethod::RssDeepScan { page: 1 })],
                vec![article(2, 1.0, DiscoveryMethod::RecentRangeScan)],
            ],
            10,
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].story_id, 1);
        assert_eq!(merged[0].discovery_method, DiscoveryMethod::SystematicBacktrack);
        assert_eq!(merged[0].relevance_score, 3.0);
    }

    #[test]
    fn test_order_and_truncate() {
        let now = Utc::now();
        let mut older = article(5, 4.0, DiscoveryMethod::RecentRangeScan);
        older.discovered_date = now - Duration::minutes(5);
        let mut newer = article(9, 4.0, DiscoveryMethod::RecentRangeScan);
        newer.discovered_date = now;
        let mut tie_a = article(7, 1.0, DiscoveryMethod::RecentRangeScan);
        tie_a.discovered_date = now;
        let mut tie_b = article(3, 1.0, DiscoveryMethod::RecentRangeScan);
        tie_b.discovered_date = now;

        let merged = merge_ranked(
            vec![
                vec![tie_a, older],
                vec![article(8, 6.0, DiscoveryMethod::SystematicBacktrack)],
                vec![newer, tie_b],
            ],
            10,
        );
        let ids: Vec<i64> = merged.iter().map(|a| a.story_id).collect();
        assert_eq!(ids, vec![8, 9, 5, 3, 7]);

        let again = merge_ranked(vec![merged.clone()], 2);
        assert_eq!(again.len(), 2);
        assert_eq!(again[0].story_id, 8);
    }

    #[test]
    fn test_empty_batches() {
        assert!(merge_ranked(vec![Vec::new(), Vec::new()], 5).is_empty());
    }
}
