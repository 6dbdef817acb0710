//! View model for the inbox.
//!
//! [`render`] is pure: given the fetched posts and the local state it
//! produces everything a front-end needs to draw, and nothing else.
use std::collections::{HashMap, HashSet};

use fedinbox_social::mastodon::Status;

use crate::favorite::{self, FavoriteControl};
use crate::share::strip_html;
use crate::store::{ClientStore, KeyValueStore};

pub const EMPTY_MESSAGE: &str = "No new posts available.";
pub const SHOW_MORE: &str = "Show More";
pub const SHOW_LESS: &str = "Show Less";

#[derive(Debug, Clone, PartialEq)]
pub enum InboxView {
    /// Nothing left to show. No post controls are offered.
    Empty { message: &'static str },
    /// At least one post, plus the "Archive All" control.
    Posts { cards: Vec<PostCard> },
}

impl InboxView {
    pub fn cards(&self) -> &[PostCard] {
        match self {
            InboxView::Empty { .. } => &[],
            InboxView::Posts { cards } => cards,
        }
    }

    pub fn visible_ids(&self) -> Vec<String> {
        self.cards().iter().map(|c| c.id.clone()).collect()
    }

    pub fn has_archive_all(&self) -> bool {
        matches!(self, InboxView::Posts { .. })
    }

    pub fn card(&self, id: &str) -> Option<&PostCard> {
        self.cards().iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostCard {
    pub id: String,
    pub author: String,
    /// Banner text, `Content Warning: <text>`.
    pub content_warning: Option<String>,
    pub content_visible: bool,
    /// Present only when there is a content warning to toggle.
    pub toggle_label: Option<&'static str>,
    pub body: String,
    pub url: String,
    pub favorited: bool,
    pub favorite_label: &'static str,
    pub favorite_pending: bool,
}

/// Build the view for `posts`, skipping archived ones.
///
/// `expanded` holds ids whose content warning has been opened. Favorite
/// membership always comes from the store, so an in-flight toggle keeps
/// showing its previous state.
pub fn render<S: KeyValueStore>(
    posts: &[Status],
    store: &ClientStore<S>,
    expanded: &HashSet<String>,
    controls: &HashMap<String, FavoriteControl>,
) -> InboxView {
    let cards: Vec<PostCard> = posts
        .iter()
        .filter(|p| !store.is_archived(&p.id))
        .map(|p| card(p, store, expanded, controls))
        .collect();

    if cards.is_empty() {
        InboxView::Empty {
            message: EMPTY_MESSAGE,
        }
    } else {
        InboxView::Posts { cards }
    }
}

fn card<S: KeyValueStore>(
    post: &Status,
    store: &ClientStore<S>,
    expanded: &HashSet<String>,
    controls: &HashMap<String, FavoriteControl>,
) -> PostCard {
    let warning = post.content_warning();
    let content_visible = warning.is_none() || expanded.contains(&post.id);
    let toggle_label = warning.map(|_| if content_visible { SHOW_LESS } else { SHOW_MORE });
    let favorited = store.is_favorited(&post.id);

    PostCard {
        id: post.id.clone(),
        author: post.account.attribution().to_string(),
        content_warning: warning.map(|w| format!("Content Warning: {w}")),
        content_visible,
        toggle_label,
        body: html_to_text(&post.content),
        url: post.canonical_url().to_string(),
        favorited,
        favorite_label: favorite::label(favorited),
        favorite_pending: controls.get(&post.id).is_some_and(FavoriteControl::is_pending),
    }
}

/// Plain-text rendition of status HTML for display: paragraph and line
/// breaks become newlines, tags are dropped, common entities decoded.
pub fn html_to_text(html: &str) -> String {
    let spaced = html
        .replace("</p><p>", "\n\n")
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n");
    let text = strip_html(&spaced);
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
