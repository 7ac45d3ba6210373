/// Rough subword token count used for prompt budget checks.
///
/// Each run of word characters costs one token per four characters (rounded
/// up), and every other non-space character costs one.
pub fn estimate_tokens(text: &str) -> usize {
    let mut tokens = 0;
    let mut run = 0usize;

    for c in text.chars() {
        if c.is_alphanumeric() || c == '_' {
            run += 1;
            continue;
        }
        tokens += run.div_ceil(4);
        run = 0;
        if !c.is_whitespace() {
            tokens += 1;
        }
    }

    tokens + run.div_ceil(4)
}
