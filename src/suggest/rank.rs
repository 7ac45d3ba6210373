use std::collections::HashSet;

/// Remove case-insensitive duplicates, keeping the first occurrence of each.
pub fn dedupe(candidates: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.to_lowercase()))
        .collect()
}

/// Pick the best candidate.
///
/// A candidate whose type prefix matches one used in recent history wins
/// outright (prefixes are tried in history order). Otherwise the candidate
/// with the most distinct words found anywhere in the history and
/// changed-file text is chosen, with earlier candidates winning ties.
///
/// Returns `None` only for an empty candidate list.
pub fn rank<'a>(candidates: &'a [String], history: &[String], changed_files: &str) -> Option<&'a str> {
    for prefix in history_prefixes(history) {
        let wanted = format!("{prefix}:");
        if let Some(hit) = candidates
            .iter()
            .find(|c| c.to_lowercase().starts_with(&wanted))
        {
            return Some(hit.as_str());
        }
    }

    let context = format!("{} {}", history.join(" "), changed_files).to_lowercase();

    let mut best: Option<(usize, &str)> = None;
    for candidate in candidates {
        let score = overlap_score(candidate, &context);
        match best {
            Some((top, _)) if score <= top => {}
            _ => best = Some((score, candidate.as_str())),
        }
    }

    log::debug!("Ranking by overlap, best score {:?}", best.map(|(s, _)| s));
    best.map(|(_, c)| c)
}

/// Count distinct words of `candidate` that occur as substrings of the
/// lower-cased `context`, so `parser` matches `src/parsers.rs`.
pub fn overlap_score(candidate: &str, context: &str) -> usize {
    words(candidate)
        .iter()
        .filter(|w| context.contains(w.as_str()))
        .count()
}

/// Lower-cased runs of alphanumerics and underscores.
pub fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn history_prefixes(history: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    history
        .iter()
        .filter_map(|line| line.split_once(':'))
        .map(|(head, _)| head.trim().to_lowercase())
        .filter(|p| !p.is_empty() && seen.insert(p.clone()))
        .collect()
}
