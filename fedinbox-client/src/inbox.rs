//! Inbox controller: owns the fetched posts and the local store, runs the
//! viewer's actions against the gateway, and keeps the view current.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use fedinbox_social::mastodon::Status;
use tracing::{info, warn};

use crate::error::ClientError;
use crate::favorite::{FavoriteAction, FavoriteControl};
use crate::gateway::TimelineGateway;
use crate::render::{InboxView, render};
use crate::share::compose_share;
use crate::store::{ClientStore, KeyValueStore};

pub const SHARE_SUCCESS: &str = "Post shared successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A message the viewer has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// Notice for a failed action, e.g. `Failed to refresh: <reason>`.
    pub fn failure(action: &str, err: &ClientError) -> Self {
        Self::error(format!("Failed to {action}: {}", err.reason()))
    }
}

pub struct Inbox<S> {
    gateway: Arc<dyn TimelineGateway>,
    store: ClientStore<S>,
    posts: Vec<Status>,
    expanded: HashSet<String>,
    controls: HashMap<String, FavoriteControl>,
    view: InboxView,
    loaded: bool,
}

impl<S: KeyValueStore> Inbox<S> {
    pub fn new(gateway: Arc<dyn TimelineGateway>, store: ClientStore<S>) -> Self {
        let view = render(&[], &store, &HashSet::new(), &HashMap::new());
        Self {
            gateway,
            store,
            posts: Vec::new(),
            expanded: HashSet::new(),
            controls: HashMap::new(),
            view,
            loaded: false,
        }
    }

    pub fn view(&self) -> &InboxView {
        &self.view
    }

    pub fn store(&self) -> &ClientStore<S> {
        &self.store
    }

    /// False until the first successful refresh.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn control(&self, id: &str) -> Option<&FavoriteControl> {
        self.controls.get(id)
    }

    /// Fetch the timeline, then reconcile favourites, then re-render.
    ///
    /// A timeline failure leaves the previous view untouched. A favourites
    /// failure, fetching or persisting, only means the cached ids are kept.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let posts = self.gateway.timeline().await.map_err(|e| {
            warn!(error = %e, "Timeline fetch failed");
            ClientError::from(e)
        })?;

        match self.gateway.favorites().await {
            Ok(ids) => {
                if let Err(e) = self.store.reconcile_favorites(ids) {
                    warn!(error = %e, "Cannot persist favourites; keeping cached set");
                }
            }
            Err(e) => warn!(error = %e, "Favourites fetch failed; keeping cached set"),
        }

        self.controls
            .retain(|id, _| posts.iter().any(|p| &p.id == id));
        self.posts = posts;
        self.loaded = true;
        self.rerender();
        info!(
            fetched = self.posts.len(),
            visible = self.view.cards().len(),
            "Inbox refreshed"
        );
        Ok(())
    }

    pub async fn archive(&mut self, id: &str) -> Result<(), ClientError> {
        self.post(id)?;
        self.store.archive(id)?;
        self.rerender();
        self.refresh().await
    }

    /// Archive every visible post in a single store write. Returns how many
    /// ids were newly archived.
    pub async fn archive_all(&mut self) -> Result<usize, ClientError> {
        let added = self.store.archive_all(self.view.visible_ids())?;
        info!(added, "Archived all visible posts");
        self.rerender();
        self.refresh().await?;
        Ok(added)
    }

    /// Open or close a post's content warning. Returns whether the body is
    /// now visible.
    pub fn toggle_content(&mut self, id: &str) -> Result<bool, ClientError> {
        self.post(id)?;
        let visible = if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        };
        self.rerender();
        Ok(visible)
    }

    /// Favorite or unfavorite a post depending on its current membership.
    /// Returns the membership after the call. On failure nothing changes.
    pub async fn toggle_favorite(&mut self, id: &str) -> Result<bool, ClientError> {
        let action = self.begin_favorite(id)?;
        self.complete_favorite(id, action).await
    }

    /// Mark the post's favorite control pending and re-render, so the card
    /// shows the in-flight state before the gateway call is made.
    pub fn begin_favorite(&mut self, id: &str) -> Result<FavoriteAction, ClientError> {
        self.post(id)?;
        let favorited = self.store.is_favorited(id);
        let action = self
            .controls
            .entry(id.to_string())
            .or_default()
            .begin(favorited)
            .ok_or_else(|| ClientError::Busy(id.to_string()))?;
        self.rerender();
        Ok(action)
    }

    /// Send a begun favorite action and commit or roll back its control.
    pub async fn complete_favorite(
        &mut self,
        id: &str,
        action: FavoriteAction,
    ) -> Result<bool, ClientError> {
        let result = match action {
            FavoriteAction::Favorite => self.gateway.favorite(id).await,
            FavoriteAction::Unfavorite => self.gateway.unfavorite(id).await,
        };

        let control = self.controls.entry(id.to_string()).or_default();
        let outcome = match result {
            Ok(_) => {
                let now = control
                    .commit()
                    .unwrap_or_else(|| action.resulting_membership());
                self.store
                    .set_favorited(id, now)
                    .map(|()| now)
                    .map_err(ClientError::from)
            }
            Err(e) => {
                control.roll_back();
                warn!(id, ?action, error = %e, "Favorite toggle failed");
                Err(e.into())
            }
        };
        self.rerender();
        outcome
    }

    /// Re-share a post through the gateway. Always yields a notice.
    pub async fn share(&self, id: &str) -> Notice {
        let text = match self.post(id) {
            Ok(post) => compose_share(post),
            Err(e) => return Notice::failure("share", &e),
        };
        match self.gateway.share(&text).await {
            Ok(_) => {
                info!(id, "Post shared");
                Notice::info(SHARE_SUCCESS)
            }
            Err(e) => {
                let err = ClientError::from(e);
                warn!(id, error = %err, "Share failed");
                Notice::error(format!(
                    "Error sharing the post: {}. Please try again or contact support.",
                    err.reason()
                ))
            }
        }
    }

    fn post(&self, id: &str) -> Result<&Status, ClientError> {
        self.posts
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ClientError::UnknownPost(id.to_string()))
    }

    fn rerender(&mut self) {
        self.view = render(&self.posts, &self.store, &self.expanded, &self.controls);
    }
}
