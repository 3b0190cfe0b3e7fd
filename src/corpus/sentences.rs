//! Sentence splitting for converted full text.

/// Split text into sentences.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or end of text,
/// or at a blank line. Single line breaks are joined with a space since
/// converted PDFs wrap lines mid-sentence. Decimal points and dotted
/// abbreviations without a following space do not end a sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\n' {
            if chars.peek() == Some(&'\n') {
                flush(&mut current, &mut sentences);
            } else {
                current.push(' ');
            }
            continue;
        }
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') && chars.peek().is_none_or(|c| c.is_whitespace()) {
            flush(&mut current, &mut sentences);
        }
    }
    flush(&mut current, &mut sentences);
    sentences
}

fn flush(current: &mut String, sentences: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_split() {
        let s = split_sentences("We used knownGene1. It was bright! Was it? Yes");
        assert_eq!(s, vec!["We used knownGene1.", "It was bright!", "Was it?", "Yes"]);
    }

    #[test]
    fn decimals_do_not_split() {
        let s = split_sentences("Expression rose 1.5 fold in abcIs123 animals.");
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn wrapped_lines_are_joined() {
        let s = split_sentences("Worms carrying\nabcIs123 were imaged.\n\nMethods");
        assert_eq!(s, vec!["Worms carrying abcIs123 were imaged.", "Methods"]);
    }

    #[test]
    fn empty_text() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences(" \n\n ").is_empty());
    }
}
