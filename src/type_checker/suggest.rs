//! "Did you mean" suggestions for unresolved names.

/// Edit distance between two strings, counted in characters.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let chars1: Vec<char> = s1.chars().collect();
    let chars2: Vec<char> = s2.chars().collect();

    if chars1.is_empty() {
        return chars2.len();
    }
    if chars2.is_empty() {
        return chars1.len();
    }

    let mut previous: Vec<usize> = (0..=chars2.len()).collect();
    let mut current = vec![0; chars2.len() + 1];

    for (i, c1) in chars1.iter().enumerate() {
        current[0] = i + 1;
        for (j, c2) in chars2.iter().enumerate() {
            let cost = if c1 == c2 { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1).min(current[j] + 1).min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[chars2.len()]
}

/// Closest candidate within `max_distance` edits. Ties go to the candidate
/// that comes first.
pub fn suggest<'a, I>(name: &str, candidates: I, max_distance: usize) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut best: Option<(usize, &String)> = None;

    for candidate in candidates {
        let distance = levenshtein_distance(name, candidate);
        if distance == 0 || distance > max_distance {
            continue;
        }

        if best.map_or(true, |(best_distance, _)| distance < best_distance) {
            best = Some((distance, candidate));
        }
    }

    best.map(|(_, candidate)| candidate.clone())
}
