//! Remote music catalog.
//!
//! The `Catalog` trait is everything the navigation loops need from the
//! media server: browsing lists, the tracks behind a navigation context, and
//! a streamable locator for one track. `JellyfinClient` implements it over
//! the Jellyfin HTTP API.

pub mod jellyfin;

pub use jellyfin::{AuthSession, JellyfinClient, authenticate};

use crate::error::Result;
use crate::navigation::NavigationContext;

/// One playable track as listed by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_id: Option<String>,
    pub index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub artist: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genre {
    pub id: String,
    pub name: String,
}

pub trait Catalog {
    fn albums(&self) -> Result<Vec<Album>>;

    fn artists(&self) -> Result<Vec<Artist>>;

    fn albums_by_artist(&self, artist_id: &str) -> Result<Vec<Album>>;

    fn genres(&self) -> Result<Vec<Genre>>;

    /// Ordered tracks behind a navigation context. Calling this twice with
    /// the same context against an unchanged server yields the same list.
    fn list_tracks(&self, context: &NavigationContext) -> Result<Vec<Track>>;

    fn stream_locator(&self, track_id: &str) -> Result<String>;
}
