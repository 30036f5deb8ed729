//! Filesystem and URL safe identifiers derived from titles.

/// Convert a title to a slug.
///
/// Lower-cases, splits camelCase boundaries, spells `&` as `and`, drops
/// apostrophes and collapses every other run of non-alphanumeric characters
/// into a single `-`. Leading and trailing dashes are trimmed.
///
/// ```
/// use pathway_core::slugify;
///
/// assert_eq!(slugify("Getting Started"), "getting-started");
/// assert_eq!(slugify("Q&A"), "q-and-a");
/// assert_eq!(slugify("Don't Panic!"), "dont-panic");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if c == '\'' || c == '\u{2019}' {
            continue;
        }

        if c == '&' {
            if !slug.is_empty() {
                slug.push('-');
            }
            slug.push_str("and");
            pending_dash = true;
        } else if c.is_alphanumeric() {
            if c.is_uppercase() && prev.is_some_and(char::is_lowercase) {
                pending_dash = true;
            }
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase().filter(|l| l.is_alphanumeric()));
        } else {
            pending_dash = true;
        }

        prev = Some(c);
    }

    slug
}
