use crate::catalog::{Catalog, Track};
use crate::error::Result;

/// How the current track list was derived, with the identifiers needed to
/// derive it again without asking the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationContext {
    Album {
        album_id: String,
        name: String,
    },
    Artist {
        artist_id: String,
        name: String,
    },
    ArtistAlbum {
        artist_id: String,
        album_id: String,
        name: String,
    },
    Genre {
        genre_id: String,
        name: String,
    },
    SongSearch {
        query: String,
    },
}

impl NavigationContext {
    pub fn kind(&self) -> &'static str {
        match self {
            NavigationContext::Album { .. } => "album",
            NavigationContext::Artist { .. } => "artist",
            NavigationContext::ArtistAlbum { .. } => "artist+album",
            NavigationContext::Genre { .. } => "genre",
            NavigationContext::SongSearch { .. } => "free-song-search",
        }
    }

    /// Word used in the "Back to ..." playback command
    pub fn back_label(&self) -> &'static str {
        match self {
            NavigationContext::Album { .. } | NavigationContext::ArtistAlbum { .. } => "album",
            NavigationContext::Artist { .. } => "artist",
            NavigationContext::Genre { .. } => "genre",
            NavigationContext::SongSearch { .. } => "search",
        }
    }

    pub fn title(&self) -> &str {
        match self {
            NavigationContext::Album { name, .. }
            | NavigationContext::Artist { name, .. }
            | NavigationContext::ArtistAlbum { name, .. }
            | NavigationContext::Genre { name, .. } => name,
            NavigationContext::SongSearch { query } => query,
        }
    }

    /// Whether tracks come from a single album, so track numbers are meaningful
    pub fn is_single_album(&self) -> bool {
        matches!(
            self,
            NavigationContext::Album { .. } | NavigationContext::ArtistAlbum { .. }
        )
    }

    /// Fetch the track list this context stands for
    pub fn derive_tracks<C: Catalog + ?Sized>(&self, catalog: &C) -> Result<Vec<Track>> {
        log::debug!("Deriving tracks for {} context '{}'", self.kind(), self.title());
        catalog.list_tracks(self)
    }
}
