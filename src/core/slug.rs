//! Slug derivation for catalog and menu entries.

/// Derives a URL slug from a display name.
///
/// The name is lowercased, characters other than ASCII letters, digits, spaces
/// and hyphens are dropped, and each run of whitespace becomes one hyphen.
/// Distinct names can produce the same slug; callers do not rely on uniqueness.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.trim().to_lowercase().chars() {
        if c.is_whitespace() {
            pending_hyphen = true;
            continue;
        }
        if !(c.is_ascii_alphanumeric() || c == '-') {
            continue;
        }
        if pending_hyphen && !slug.is_empty() {
            slug.push('-');
        }
        pending_hyphen = false;
        slug.push(c);
    }

    slug
}
