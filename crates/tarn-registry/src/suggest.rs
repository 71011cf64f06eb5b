//! "Did you mean" lookup for unknown command names.

/// Pick the single known name closest to `input`.
///
/// Prefix matches win, then substring matches (shortest first), then the
/// smallest Damerau-Levenshtein distance within `len / 2 + 1`. Ties resolve
/// alphabetically so the answer is stable.
pub fn closest<'a, I>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let input = input.to_lowercase();
    if input.is_empty() {
        return None;
    }

    let mut names: Vec<&str> = candidates.into_iter().collect();
    names.sort_unstable();
    names.dedup();

    let shortest = |matches: Vec<&str>| -> Option<String> {
        matches
            .into_iter()
            .min_by_key(|name| name.len())
            .map(str::to_string)
    };

    let prefixed: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| name.starts_with(&input))
        .collect();
    if let Some(best) = shortest(prefixed) {
        return Some(best);
    }

    let containing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| name.contains(&input) || input.contains(*name))
        .collect();
    if let Some(best) = shortest(containing) {
        return Some(best);
    }

    let threshold = input.chars().count() / 2 + 1;
    names
        .iter()
        .map(|name| (strsim::damerau_levenshtein(&input, name), *name))
        .filter(|(distance, _)| *distance <= threshold)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, name)| name.to_string())
}
