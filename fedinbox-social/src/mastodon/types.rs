use serde::{Deserialize, Serialize};

/// A Mastodon status as the inbox sees it.
///
/// Only the fields the inbox renders are modelled; everything else in the
/// upstream payload is ignored on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    /// Rendered HTML body.
    #[serde(default)]
    pub content: String,
    /// Content warning; empty when the author did not set one.
    #[serde(default)]
    pub spoiler_text: String,
    pub account: Account,
    /// Link to the HTML page of the status. Mastodon sends `null` for some
    /// remote statuses.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub favourited: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Status {
    /// Content warning text, if one is present and not blank.
    pub fn content_warning(&self) -> Option<&str> {
        let cw = self.spoiler_text.trim();
        (!cw.is_empty()).then_some(self.spoiler_text.as_str())
    }

    /// The canonical URL, falling back to the ActivityPub `uri`.
    pub fn canonical_url(&self) -> &str {
        self.url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.uri)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub acct: Option<String>,
}

impl Account {
    /// Display name when set and non-empty, otherwise the username.
    pub fn attribution(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}
