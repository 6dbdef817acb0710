//! Social network clients used by fedinbox.
//!
//! Only the Mastodon v1 REST surface is implemented: the public timeline,
//! status creation, favourites and the favourites list. The gateway talks to
//! it through the [`mastodon::TimelineUpstream`] trait so tests can swap in
//! a double.
pub mod mastodon;
