// file: src/utils/text.rs
// description: tokenization and word-level helpers shared by indexing and chunking
// reference: https://doc.rust-lang.org/std/primitive.str.html#method.split_whitespace

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of", "on",
    "or", "that", "the", "this", "to", "was", "we", "with",
];

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.binary_search(&token).is_ok()
}

/// Lowercased alphanumeric runs with stopwords and single characters dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .map(str::to_lowercase)
        .filter(|t| !is_stopword(t))
        .collect()
}

/// Lowercased alphanumeric words joined by single spaces, for phrase comparison.
pub fn normalize_phrase(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Byte offsets where each whitespace-delimited word begins.
pub fn word_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut in_word = false;

    for (offset, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            starts.push(offset);
            in_word = true;
        }
    }

    starts
}

/// First `max_words` words of `text`, with an ellipsis when truncated.
pub fn snippet(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        words.join(" ")
    } else {
        format!("{}...", words[..max_words].join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwords_sorted_for_binary_search() {
        let mut sorted = STOPWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOPWORDS);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Shor's algorithm factors the integer N"),
            vec!["shor", "algorithm", "factors", "integer"]
        );
    }

    #[test]
    fn test_normalize_phrase() {
        assert_eq!(normalize_phrase("Attention Is  All-You Need!"), "attention is all you need");
    }

    #[test]
    fn test_word_starts() {
        assert_eq!(word_starts("  ab c\n\nde "), vec![2, 5, 8]);
        assert!(word_starts("   ").is_empty());
    }

    #[test]
    fn test_snippet() {
        assert_eq!(snippet("one two three", 5), "one two three");
        assert_eq!(snippet("one two three", 2), "one two...");
    }
}
