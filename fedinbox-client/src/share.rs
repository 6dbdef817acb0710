use std::borrow::Cow;
use std::sync::LazyLock;

use fedinbox_social::mastodon::Status;
use regex::Regex;

/// Any tag, including an unterminated `<...` at the end of the input.
static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>?").expect("Invalid tag regex"));

/// Remove every HTML tag. Entities are left as they are.
pub fn strip_html(html: &str) -> Cow<'_, str> {
    TAG_REGEX.replace_all(html, "")
}

/// Text posted when re-sharing `status`: its body without markup, then an
/// en dash and the author's display name (or username).
pub fn compose_share(status: &Status) -> String {
    let text = strip_html(&status.content);
    let author = status.account.attribution();
    format!("{} – {}", text.trim(), strip_html(author).trim())
}
