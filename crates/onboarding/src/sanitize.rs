//! Plain-text sanitizers applied to everything the wizard submits.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_OR_STYLE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script\s*>|<style[^>]*>.*?</style\s*>").ok()
});
static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());
static WHITESPACE_RUN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[\r\n\t ]+").ok());
static PERCENT_OCTET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"%[0-9a-fA-F]{2}").ok());
static SPACE_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r" +").ok());

fn replace_all(pattern: &LazyLock<Option<Regex>>, input: &str, with: &str) -> String {
    match pattern.as_ref() {
        Some(re) => re.replace_all(input, with).into_owned(),
        None => input.to_owned(),
    }
}

fn strip_tags(input: &str) -> String {
    replace_all(&TAG, &replace_all(&SCRIPT_OR_STYLE, input, ""), "")
}

/// Remove every HTML tag, dropping `<script>` and `<style>` blocks with
/// their contents.
pub fn strip_all_tags(input: &str) -> String {
    strip_tags(input).trim().to_owned()
}

/// Single-line sanitizer: strips tags, collapses all whitespace (newlines
/// included) to one space, removes percent-encoded octets and trims.
pub fn sanitize_text_field(input: &str) -> String {
    sanitize(input, false)
}

/// Multi-line sanitizer: like [`sanitize_text_field`] but line breaks and
/// inner whitespace survive.
pub fn sanitize_textarea_field(input: &str) -> String {
    sanitize(input, true)
}

fn sanitize(input: &str, keep_newlines: bool) -> String {
    let mut out = if input.contains('<') {
        strip_tags(input)
    } else {
        input.to_owned()
    };

    if !keep_newlines {
        out = replace_all(&WHITESPACE_RUN, &out, " ");
    }
    out = out.trim().to_owned();

    if PERCENT_OCTET.as_ref().is_some_and(|re| re.is_match(&out)) {
        out = replace_all(&PERCENT_OCTET, &out, "");
        out = replace_all(&SPACE_RUN, &out, " ").trim().to_owned();
    }
    out
}

/// Truncate to at most `max` characters (not bytes).
pub fn truncate_chars(input: &str, max: usize) -> String {
    match input.char_indices().nth(max) {
        Some((byte_idx, _)) => input[..byte_idx].to_owned(),
        None => input.to_owned(),
    }
}
