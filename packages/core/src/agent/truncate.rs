//! Final-answer truncation.
//!
//! Lengths are counted in characters. Only the final answer is truncated,
//! never intermediate turns.

const SENTENCE_ENDINGS: [char; 4] = ['.', '!', '?', '\n'];
const BOUNDARY_WINDOW: usize = 200;
const ELLIPSIS: &str = "...";

/// Cut `text` to about `max_length` characters at a sentence or word
/// boundary. `max_length == 0` disables truncation.
///
/// A boundary is used only if it keeps more than 80% of `max_length`;
/// otherwise the text is hard-cut. An ellipsis is appended whenever the
/// result is shorter than the input, so the output is at most
/// `max_length + 3` characters.
pub fn truncate_response(text: &str, max_length: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if max_length == 0 || chars.len() <= max_length {
        return text.to_string();
    }

    let window = &chars[..max_length];
    let floor = max_length as f64 * 0.8;

    let lower = window.len().saturating_sub(BOUNDARY_WINDOW);
    let sentence_end = (lower + 1..window.len()).rev().find_map(|i| {
        let followed_by_space = window.get(i + 1).map_or(true, |c| *c == ' ' || *c == '\n');
        (SENTENCE_ENDINGS.contains(&window[i]) && followed_by_space).then_some(i + 1)
    });

    let cut = match sentence_end {
        Some(end) if end as f64 > floor => end,
        _ => match window.iter().rposition(|c| *c == ' ') {
            Some(space) if space as f64 > floor => space,
            _ => max_length,
        },
    };

    let mut truncated: String = window[..cut].iter().collect::<String>().trim().to_string();
    if chars.len() > truncated.chars().count() {
        truncated.push_str(ELLIPSIS);
    }
    truncated
}
