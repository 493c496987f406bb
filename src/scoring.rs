use crate::db::models::Value;

/// Normalize free text for comparison against positive values.
///
/// Lowercases and trims, then removes the article prefixes `"the "`,
/// `"a "` and `"az "` (each a single replace-all pass, in that order),
/// followed by all spaces and hyphens.
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .replace("the ", "")
        .replace("a ", "")
        .replace("az ", "")
        .replace(' ', "")
        .replace('-', "")
}

/// Levenshtein distance over Unicode code points, unit cost for
/// insertions, deletions and substitutions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost)
                .min(prev[j + 1] + 1)
                .min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Score a submitted answer against a question's accepted values.
///
/// Values are scanned in their configured order, first match wins.
/// Non-positive values (penalties and distractors) are compared
/// unmodified; positive values are compared after [`normalize`] has been
/// applied to both sides. A value with `allowed_misses > 0` matches when
/// the edit distance is strictly below the threshold, otherwise the
/// strings must be equal. When nothing matches, the question's base
/// points are returned.
///
/// Scores are recomputed on every read and never stored, so editing a
/// value retroactively changes the score of already submitted answers.
pub fn score(answer: &str, values: &[Value], base_points: i32) -> f64 {
    for value in values.iter().filter(|v| v.points <= 0.0) {
        if value.allowed_misses > 0 {
            if levenshtein(&value.text, answer) < value.allowed_misses as usize {
                return value.points;
            }
        } else if value.text == answer {
            return value.points;
        }
    }

    let answer = normalize(answer);
    for value in values.iter().filter(|v| v.points > 0.0) {
        let text = normalize(&value.text);
        if value.allowed_misses > 0 {
            if levenshtein(&text, &answer) < value.allowed_misses as usize {
                return value.points;
            }
        } else if text == answer {
            return value.points;
        }
    }

    f64::from(base_points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str, allowed_misses: i32, points: f64) -> Value {
        Value {
            id: 0,
            question_id: 0,
            text: text.to_string(),
            allowed_misses,
            points,
            order_number: None,
        }
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
    }

    #[test]
    fn levenshtein_counts_code_points_not_bytes() {
        assert_eq!(levenshtein("őz", "oz"), 1);
        assert_eq!(levenshtein("árvíztűrő", "árvíztűrő"), 0);
    }

    #[test]
    fn normalize_strips_articles_spaces_and_hyphens() {
        assert_eq!(normalize("  The Great-Wall  "), "greatwall");
        assert_eq!(normalize("az alma"), "alma");
        assert_eq!(normalize("A Cat"), "cat");
    }

    #[test]
    fn positive_value_matches_after_normalization() {
        let values = vec![value("Paris", 0, 5.0)];
        assert_eq!(score("paris", &values, 0), 5.0);
    }

    #[test]
    fn fuzzy_positive_match_within_threshold() {
        let values = vec![value("the cat", 2, 3.0)];
        assert_eq!(score("cat", &values, 0), 3.0);
        assert_eq!(score("cap", &values, 0), 3.0);
        assert_eq!(score("dog", &values, 0), 0.0);
    }

    #[test]
    fn penalty_requires_exact_unnormalized_match() {
        let values = vec![value("Cat", 0, -1.0)];
        assert_eq!(score("Cat", &values, 0), -1.0);
        // Case differs, so the penalty does not fire.
        assert_eq!(score("cat", &values, 0), 0.0);
    }

    #[test]
    fn penalty_match_preempts_positive_match() {
        let values = vec![value("cat", 0, 2.0), value("cat", 0, -1.0)];
        assert_eq!(score("cat", &values, 0), -1.0);
    }

    #[test]
    fn fuzzy_penalty_uses_raw_text() {
        let values = vec![value("budapest", 3, -2.0)];
        assert_eq!(score("budapesd", &values, 0), -2.0);
    }

    #[test]
    fn zero_point_value_is_a_distractor() {
        let values = vec![value("wrong", 0, 0.0), value("wrong", 0, 4.0)];
        assert_eq!(score("wrong", &values, 1), 0.0);
    }

    #[test]
    fn first_matching_value_in_order_wins() {
        let values = vec![value("cat", 1, 2.0), value("cat", 0, 7.0)];
        assert_eq!(score("cat", &values, 0), 2.0);
    }

    #[test]
    fn no_match_falls_back_to_base_points() {
        let values = vec![value("cat", 0, 3.0)];
        assert_eq!(score("dog", &values, 2), 2.0);
        assert_eq!(score("dog", &[], -1), -1.0);
    }
}
