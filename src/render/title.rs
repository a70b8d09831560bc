use crate::foundation::core::{VariableMode, format_value};

/// Chart title for a task, e.g. `AES Encrypt on 4 Threads` or `AES Encrypt on an 8 Bytes Vector`.
pub fn chart_title(test_case: &str, mode: VariableMode, value: f64) -> String {
    let v = format_value(value);
    let plural = if value == 1.0 { "" } else { "s" };
    match mode {
        VariableMode::Size => format!("{test_case} on {v} Thread{plural}"),
        VariableMode::Threads => format!(
            "{test_case} on {} {v} Byte{plural} Vector",
            indefinite_article(value)
        ),
    }
}

/// `"an"` when the spoken number starts with a vowel sound (8, 11, 18, 80..89, 8000, ...).
pub fn indefinite_article(value: f64) -> &'static str {
    if !(value.is_finite() && value.fract() == 0.0 && value >= 0.0) {
        return if format_value(value).starts_with('8') {
            "an"
        } else {
            "a"
        };
    }
    let mut lead = value as u64;
    while lead >= 1000 {
        lead /= 1000;
    }
    if lead == 11 || lead == 18 || lead.to_string().starts_with('8') {
        "an"
    } else {
        "a"
    }
}

/// Split a sentence in two at the first word boundary past half its length.
///
/// A sentence without a usable boundary comes back whole, with an empty second line.
pub fn split_half(s: &str) -> (&str, &str) {
    let mid = s.len() / 2;
    let mut pos = 0usize;
    for word in s.split(' ') {
        pos += word.len() + 1;
        if pos > mid {
            break;
        }
    }
    let head = s.get(..pos.saturating_sub(1)).unwrap_or(s);
    let tail = s.get(pos..).unwrap_or("");
    (head, tail)
}

#[cfg(test)]
#[path = "../../tests/unit/render/title.rs"]
mod tests;
