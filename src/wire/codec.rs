//! Token line encoding.

/// Join tokens with single spaces and terminate with a newline.
///
/// An empty token list encodes to `"\n"`.
pub fn encode<S: AsRef<str>>(tokens: &[S]) -> String {
    let len = tokens.iter().map(|t| t.as_ref().len() + 1).sum::<usize>().max(1);
    let mut line = String::with_capacity(len);
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(token.as_ref());
    }
    line.push('\n');
    line
}

/// Split a line into tokens after stripping one trailing newline.
///
/// Always returns at least one token, so `tokens[0]` is the verb even for
/// an empty line: `decode("")` is `[""]`.
pub fn decode(line: &str) -> Vec<&str> {
    line.strip_suffix('\n').unwrap_or(line).split(' ').collect()
}
