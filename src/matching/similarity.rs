//! String similarity ratios on a 0-100 scale.
//!
//! All ratios are built on normalized Levenshtein similarity and operate on
//! preprocessed text: lower-cased, with every non-alphanumeric character
//! replaced by a space and runs of whitespace collapsed. Letters outside
//! ASCII (umlauts, accents) are kept as they are.
//!
//! | Ratio | Use |
//! |-------|-----|
//! | [`ratio`] | plain comparison of two preprocessed strings |
//! | [`token_sort_ratio`] | titles: word order does not matter |
//! | [`partial_ratio`] | names: best window of the longer string |

/// Lower-case, strip punctuation, collapse whitespace
pub fn preprocess(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity of two preprocessed strings; 0 if either is empty
pub fn ratio(a: &str, b: &str) -> u8 {
    let a = preprocess(a);
    let b = preprocess(b);
    raw_ratio(&a, &b)
}

/// Similarity after sorting each string's words alphabetically.
///
/// Symmetric with respect to word order; a missing or extra word still costs.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    raw_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Best similarity between the shorter string and any equally long window of
/// the longer one, so that `"smith"` scores 100 against `"john smith"`.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a = preprocess(a);
    let b = preprocess(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    let needle: String = shorter.iter().collect();
    let width = shorter.len();
    let mut best = 0;

    for start in 0..=(longer.len() - width) {
        let window: String = longer[start..start + width].iter().collect();
        let score = raw_ratio(&needle, &window);
        if score > best {
            best = score;
            if best == 100 {
                break;
            }
        }
    }

    best
}

fn sorted_tokens(s: &str) -> String {
    let processed = preprocess(s);
    let mut tokens: Vec<&str> = processed.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn raw_ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let similarity = strsim::normalized_levenshtein(a, b);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // in 0..=100
    let score = (similarity * 100.0).round() as u8;
    score
}
