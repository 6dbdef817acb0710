//! Favorite toggle for a single post.
//!
//! The control never flips on its own: it records the action it asked the
//! gateway for and waits. Success commits the flip, failure rolls back to
//! what was shown before. While a request is in flight a second toggle is
//! refused.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    Favorite,
    Unfavorite,
}

impl FavoriteAction {
    /// The action that flips the given membership.
    pub fn toggling(favorited: bool) -> Self {
        if favorited {
            FavoriteAction::Unfavorite
        } else {
            FavoriteAction::Favorite
        }
    }

    /// Membership once this action has succeeded.
    pub fn resulting_membership(self) -> bool {
        matches!(self, FavoriteAction::Favorite)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FavoriteState {
    #[default]
    Idle,
    Pending(FavoriteAction),
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, Default)]
pub struct FavoriteControl {
    state: FavoriteState,
}

impl FavoriteControl {
    pub fn state(&self) -> FavoriteState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, FavoriteState::Pending(_))
    }

    /// Start toggling a post whose current membership is `favorited`.
    /// Returns `None` when a request is already in flight.
    pub fn begin(&mut self, favorited: bool) -> Option<FavoriteAction> {
        if self.is_pending() {
            return None;
        }
        let action = FavoriteAction::toggling(favorited);
        self.state = FavoriteState::Pending(action);
        Some(action)
    }

    /// The gateway accepted the action. Returns the new membership.
    pub fn commit(&mut self) -> Option<bool> {
        let FavoriteState::Pending(action) = self.state else {
            return None;
        };
        self.state = FavoriteState::Committed;
        Some(action.resulting_membership())
    }

    /// The gateway call failed; nothing changes apart from the state tag.
    pub fn roll_back(&mut self) {
        if self.is_pending() {
            self.state = FavoriteState::RolledBack;
        }
    }
}

/// Button label for a post with the given membership.
pub fn label(favorited: bool) -> &'static str {
    if favorited { "Unfavorite" } else { "Favorite" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_picks_the_flipping_action() {
        let mut control = FavoriteControl::default();
        assert_eq!(control.begin(false), Some(FavoriteAction::Favorite));
        assert_eq!(control.state(), FavoriteState::Pending(FavoriteAction::Favorite));

        let mut control = FavoriteControl::default();
        assert_eq!(control.begin(true), Some(FavoriteAction::Unfavorite));
    }

    #[test]
    fn second_begin_while_pending_is_refused() {
        let mut control = FavoriteControl::default();
        control.begin(false);
        assert_eq!(control.begin(false), None);
        assert!(control.is_pending());
    }

    #[test]
    fn commit_reports_new_membership() {
        let mut control = FavoriteControl::default();
        control.begin(true);
        assert_eq!(control.commit(), Some(false));
        assert_eq!(control.state(), FavoriteState::Committed);
        // already settled
        assert_eq!(control.commit(), None);
    }

    #[test]
    fn roll_back_settles_without_membership_change() {
        let mut control = FavoriteControl::default();
        control.begin(false);
        control.roll_back();
        assert_eq!(control.state(), FavoriteState::RolledBack);
        assert_eq!(control.begin(false), Some(FavoriteAction::Favorite));
    }

    #[test]
    fn labels() {
        assert_eq!(label(true), "Unfavorite");
        assert_eq!(label(false), "Favorite");
    }
}
