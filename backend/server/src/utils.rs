/// Escapes `LIKE` wildcards so user text only ever matches literally. Pair with `ESCAPE '\'`.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// Trimmed text if it has at least `min_chars` characters.
pub fn long_enough(input: Option<&str>, min_chars: usize) -> Option<&str> {
    input
        .map(str::trim)
        .filter(|text| text.chars().count() >= min_chars)
}
