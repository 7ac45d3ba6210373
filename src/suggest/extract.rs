use super::tag::CommitType;

/// Markers the prompt ends with; anything before them is prompt echo.
const MARKERS: [&str; 2] = ["Messages:", "Message:"];

/// Line openings that mean the model is echoing code, diffs or tracebacks.
const CODE_OPENINGS: &[&str] = &[
    "#", "//", "/*", "```", "+", "@@", "diff --git", "index ", ">>>", "def ", "class ", "import ",
    "from ", "fn ", "pub ", "let ", "const ", "var ", "return ", "if (", "for (", "at ", "file \"",
];

/// Fragments that never show up in a sensible commit subject.
const CODE_FRAGMENTS: &[&str] = &[
    "print(",
    "println!(",
    "console.log(",
    "return none",
    "return null",
    "traceback",
    "stack trace",
    "exception:",
    "();",
    " = ",
    "=>",
];

/// Fragments of our own instructions, in case the model repeats them.
const INSTRUCTION_ECHOES: &[&str] = &[
    "example commits",
    "changed files:",
    "rules:",
    "diff:",
    "follow the format",
    "imperative mood",
    "one per line",
    "conventional commit messages summarizing",
    "do not copy code",
];

/// Heuristic for lines that are code, stack traces or echoed instructions
/// rather than a commit subject. Such lines are dropped, not cleaned.
pub fn looks_like_noise(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    if lower.is_empty() {
        return false;
    }

    if lower.starts_with("exception") {
        return true;
    }
    if CODE_OPENINGS.iter().any(|p| lower.starts_with(p)) {
        return true;
    }
    if CODE_FRAGMENTS.iter().any(|f| lower.contains(f)) {
        return true;
    }
    if INSTRUCTION_ECHOES.iter().any(|f| lower.contains(f)) {
        return true;
    }

    lower.ends_with(';') || lower.ends_with('{') || lower.ends_with('}')
}

/// Drop list numbering and bullets: `1. `, `2) `, `- `, `* `, `• `.
pub fn strip_enumeration(line: &str) -> &str {
    line.trim_start_matches(|c: char| {
        c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | ')' | '.' | '*' | '•')
    })
}

/// Normalise one candidate into `type: description` form.
///
/// Returns `None` when nothing usable remains. The output starts with a
/// lower-case tag and a colon, holds no control characters, and is at most
/// `max_len` characters long. Applying `clean` to its own output is a no-op.
pub fn clean(line: &str, max_len: usize) -> Option<String> {
    let first = line.lines().next()?;
    let printable: String = first.chars().filter(|c| !c.is_ascii_control()).collect();
    let text = printable.trim();
    if text.is_empty() {
        return None;
    }

    let message = match CommitType::split_header(text) {
        Some((_, rest)) if rest.is_empty() => return None,
        Some((tag, rest)) => format!("{tag}: {rest}"),
        None => format!("{}: {text}", CommitType::DEFAULT),
    };

    Some(truncate_chars(&message, max_len).trim_end().to_string())
}

/// Pull every usable candidate out of one raw completion.
pub fn extract(raw: &str, max_len: usize) -> Vec<String> {
    after_marker(raw)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !looks_like_noise(line))
        .map(strip_enumeration)
        .filter(|line| !looks_like_noise(line))
        .filter_map(|line| clean(line, max_len))
        .collect()
}

fn after_marker(raw: &str) -> &str {
    MARKERS
        .iter()
        .find_map(|m| raw.find(m).map(|idx| &raw[idx + m.len()..]))
        .unwrap_or(raw)
}

/// Cut `s` to at most `max` characters on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
