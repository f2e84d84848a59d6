//! Citation extraction from generated answers

use crate::retrieval::RetrievalResult;
use ahash::{HashSet, HashSetExt};
use regex::Regex;
use std::sync::OnceLock;

fn citation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\[chunks?\s+(\d+(?:\s*,\s*\d+)*)\]").expect("citation pattern is valid")
    })
}

/// Chunk sequence indices cited as `[Chunk N]` (or `[Chunks N, M]`) in
/// `answer`, in order of first appearance. Citations that do not refer to
/// one of `sources` are ignored, so a generator cannot cite text it was
/// never shown.
pub fn extract_citations(answer: &str, sources: &[RetrievalResult]) -> Vec<usize> {
    let available: HashSet<usize> = sources.iter().map(|s| s.chunk.index).collect();
    let mut seen = HashSet::new();
    let mut cited = Vec::new();

    for cap in citation_pattern().captures_iter(answer) {
        let Some(list) = cap.get(1) else { continue };
        for number in list.as_str().split(',') {
            let Ok(index) = number.trim().parse::<usize>() else {
                continue;
            };
            if available.contains(&index) && seen.insert(index) {
                cited.push(index);
            }
        }
    }

    cited
}
