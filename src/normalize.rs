// Name normalization
//
// Every child name and every query fragment goes through `normalize` before
// comparison, so `with_alias`, `with-alias` and `WithAlias` are the same key.

/// Reduce an identifier to its lowercase alphanumeric form
pub fn normalize(identifier: &str) -> String {
    identifier
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Split raw query arguments into path fragments.
///
/// Each argument may itself hold several fragments separated by whitespace or
/// dots (`"git commit"`, `git.commit`).
pub fn split_query<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| {
            arg.as_ref()
                .split(|c: char| c.is_whitespace() || c == '.')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}
