use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

pub fn fuzzy_score(needle: &str, hay: &str) -> Option<i64> {
    let m = SkimMatcherV2::default();
    m.fuzzy_match(hay, needle)
}

/// Best-scoring candidate for `needle`, first one wins on ties.
pub fn suggest<'a>(needle: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let m = SkimMatcherV2::default();
    let mut best: Option<(i64, &'a str)> = None;
    for c in candidates {
        if let Some(score) = m.fuzzy_match(c, needle) {
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, c));
            }
        }
    }
    best.map(|(_, c)| c)
}
