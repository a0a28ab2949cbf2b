//! Storage filename derivation
//!
//! Every publish path derives its filename here so the rules cannot drift:
//! the extension is lowercased with exactly one leading dot, a title that
//! already carries the extension is not doubled up, whitespace collapses to
//! a single `_`, and anything unsafe for a filename is dropped.

/// Fallback extension when the caller supplies none
const DEFAULT_EXTENSION: &str = "txt";

/// A normalized file extension in both of its useful spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedExtension {
    /// With exactly one leading dot, e.g. `.txt`
    pub dotted: String,
    /// Without the dot, e.g. `txt`
    pub bare: String,
}

/// Normalize a raw extension input such as `".txt"`, `"txt"` or `" .TXT "`.
///
/// Leading dots and interior whitespace are stripped and the result is
/// lowercased. Empty input falls back to `txt`.
pub fn normalize_extension(raw: &str) -> NormalizedExtension {
    let bare: String = raw
        .trim()
        .trim_start_matches('.')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let bare = if bare.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        bare
    };
    NormalizedExtension {
        dotted: format!(".{}", bare),
        bare,
    }
}

/// Remove one trailing `.{bare}` extension from `name`, case-insensitively.
///
/// `strip_trailing_extension("foo.TXT", "txt")` is `"foo"`; a name without
/// the extension is returned unchanged, and a name that is exactly the
/// dotted extension strips to the empty stem.
pub fn strip_trailing_extension<'a>(name: &'a str, bare: &str) -> &'a str {
    if bare.is_empty() {
        return name;
    }
    let suffix_len = bare.len() + 1;
    if name.len() >= suffix_len && name.is_char_boundary(name.len() - suffix_len) {
        let (stem, tail) = name.split_at(name.len() - suffix_len);
        if let Some(rest) = tail.strip_prefix('.') {
            if rest.eq_ignore_ascii_case(bare) {
                return stem;
            }
        }
    }
    name
}

/// Derive the safe storage filename for a title and a raw extension input.
///
/// The title is trimmed, a matching trailing extension is stripped so
/// `("notes.md", ".md")` does not become `notes.md.md`, whitespace runs
/// collapse to a single `_`, and characters outside `[A-Za-z0-9_\-.]` are
/// dropped.
pub fn storage_filename(title: &str, raw_ext: &str) -> String {
    let ext = normalize_extension(raw_ext);
    let stem = strip_trailing_extension(title.trim(), &ext.bare);

    let mut base = String::with_capacity(stem.len());
    let mut pending_separator = false;
    for c in stem.chars() {
        if c.is_whitespace() {
            pending_separator = !base.is_empty();
            continue;
        }
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
            if pending_separator {
                base.push('_');
                pending_separator = false;
            }
            base.push(c);
        }
    }

    format!("{}{}", base, ext.dotted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_messy_extension_input() {
        assert_eq!(normalize_extension(" .TXT ").bare, "txt");
        assert_eq!(normalize_extension("txt").dotted, ".txt");
        assert_eq!(normalize_extension(".txt").dotted, ".txt");
        assert_eq!(normalize_extension("..rs").bare, "rs");
    }

    #[test]
    fn empty_extension_defaults_to_txt() {
        assert_eq!(normalize_extension("").dotted, ".txt");
        assert_eq!(normalize_extension("   ").bare, "txt");
        assert_eq!(normalize_extension(".").bare, "txt");
    }

    #[test]
    fn strips_matching_trailing_extension_only() {
        assert_eq!(strip_trailing_extension("notes.md", "md"), "notes");
        assert_eq!(strip_trailing_extension("notes.MD", "md"), "notes");
        assert_eq!(strip_trailing_extension("notes.rs", "md"), "notes.rs");
        assert_eq!(strip_trailing_extension("md", "md"), "md");
        assert_eq!(strip_trailing_extension(".md", "md"), "");
    }

    #[test]
    fn derives_safe_filename_from_title() {
        assert_eq!(storage_filename("My Report", "TXT"), "My_Report.txt");
    }

    #[test]
    fn does_not_double_an_extension_already_in_the_title() {
        assert_eq!(storage_filename("notes.md", ".md"), "notes.md");
    }

    #[test]
    fn title_that_is_only_the_extension_is_not_doubled() {
        assert_eq!(storage_filename(".txt", "txt"), ".txt");
    }

    #[test]
    fn collapses_whitespace_and_drops_unsafe_characters() {
        assert_eq!(storage_filename("  a   b/c?*.py  ", "py"), "a_bc.py");
        assert_eq!(storage_filename("héllo wörld", "txt"), "hllo_wrld.txt");
    }

    #[test]
    fn keeps_interior_dots_and_dashes() {
        assert_eq!(storage_filename("v1.2-final", "json"), "v1.2-final.json");
    }
}
