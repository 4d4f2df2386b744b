//! Answer-to-display transform.
//!
//! Provider answers are plain text with light markdown emphasis. The display
//! form is a small markup dialect (`<strong>`, `<em>`, `<br>`) that the front
//! end renders. Rules run in a fixed order: later rules see the output of
//! earlier ones, so emphasis is converted before any break is inserted.

use std::sync::LazyLock;

use regex::Regex;

/// Display break inserted for newlines and after punctuation.
pub const BREAK: &str = "<br>";

static BOLD: LazyLock<Regex> = LazyLock::new(|| compile(r"\*\*(.*?)\*\*"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| compile(r"\*(.*?)\*"));

/// Punctuation followed by a space that gets a break instead of the space.
const PUNCTUATION_BREAKS: [(&str, &str); 5] = [
    (". ", ".<br>"),
    ("! ", "!<br>"),
    ("? ", "?<br>"),
    (", ", ",<br>"),
    ("; ", ";<br>"),
];

fn compile(pattern: &str) -> Regex {
    // Patterns are literals above; a failure here is a programming error.
    Regex::new(pattern).expect("static emphasis pattern must compile")
}

/// Converts a raw provider answer into display markup.
pub fn to_display(raw: &str) -> String {
    let text = BOLD.replace_all(raw, "<strong>${1}</strong>");
    let text = ITALIC.replace_all(&text, "<em>${1}</em>");
    let mut text = text.replace('\n', BREAK);
    for (from, to) in PUNCTUATION_BREAKS {
        text = text.replace(from, to);
    }
    text
}

/// Splits display text into alternating whitespace and non-whitespace runs.
///
/// Whitespace runs are kept as tokens of their own, so concatenating the
/// result always reproduces `display`. No empty tokens are produced.
pub fn tokenize(display: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut prev_space: Option<bool> = None;

    for (idx, ch) in display.char_indices() {
        let is_space = ch.is_whitespace();
        if prev_space.is_some_and(|prev| prev != is_space) {
            tokens.push(&display[start..idx]);
            start = idx;
        }
        prev_space = Some(is_space);
    }
    if start < display.len() {
        tokens.push(&display[start..]);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_break_example() {
        let display = to_display("Hello there. How are you?");
        assert_eq!(display, "Hello there.<br>How are you?");
        assert_eq!(
            tokenize(&display),
            vec!["Hello", " ", "there.<br>How", " ", "are", " ", "you?"]
        );
    }

    #[test]
    fn emphasis_is_converted_before_breaks() {
        assert_eq!(
            to_display("**Note**, this is *fine*; ok"),
            "<strong>Note</strong>,<br>this is <em>fine</em>;<br>ok"
        );
    }

    #[test]
    fn bold_is_non_greedy() {
        assert_eq!(
            to_display("**a** and **b**"),
            "<strong>a</strong> and <strong>b</strong>"
        );
    }

    #[test]
    fn emphasis_does_not_span_lines() {
        assert_eq!(to_display("*a\nb*"), "*a<br>b*");
    }

    #[test]
    fn newlines_and_exclamations_become_breaks() {
        assert_eq!(to_display("Wow! Yes\nNo"), "Wow!<br>Yes<br>No");
    }

    #[test]
    fn punctuation_without_trailing_space_is_untouched() {
        assert_eq!(to_display("3.14,2;1"), "3.14,2;1");
    }

    #[test]
    fn tokenize_preserves_whitespace_runs() {
        let text = "  lead\t\tmid  end \n";
        let tokens = tokenize(text);
        assert_eq!(tokens, vec!["  ", "lead", "\t\t", "mid", "  ", "end", " \n"]);
        assert_eq!(tokens.concat(), text);
    }

    #[test]
    fn tokenize_empty_input() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn tokenize_reconstructs_formatted_answers() {
        let answers = [
            "Plain answer",
            "**Bold** start, then *italic*.\n\nNew paragraph! Really? Yes; done.",
            "unicode café · naïve\u{00a0}spacing",
            "   ",
        ];
        for answer in answers {
            let display = to_display(answer);
            assert_eq!(tokenize(&display).concat(), display, "answer: {answer:?}");
        }
    }
}
