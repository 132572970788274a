//! Domain models for the music catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ===== Tracks =====

/// A single playable track resolved from the remote catalog.
///
/// `duration_secs` is only populated by [`crate::CatalogClient::track_details`];
/// list endpoints do not return durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Backend video identifier, also the playback media id.
    pub id: String,
    pub title: String,
    /// Channel name, used as the artist label.
    pub artist: String,
    pub thumbnail_url: String,
    pub thumbnail_high_url: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<u32>,
}

/// One page of search results plus the cursor for the next page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub tracks: Vec<Track>,
    pub next_page_token: Option<String>,
    pub total_results: u64,
}

// ===== Categories =====

/// A curated browse category backed by a canned search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusicCategory {
    pub id: &'static str,
    pub name: &'static str,
    pub query: &'static str,
}

/// The browse categories shown on the home surface, in display order.
pub const MUSIC_CATEGORIES: &[MusicCategory] = &[
    MusicCategory { id: "pop", name: "Pop", query: "pop hits 2024" },
    MusicCategory { id: "hiphop", name: "Hip-Hop", query: "hip hop music 2024" },
    MusicCategory { id: "rock", name: "Rock", query: "rock music hits" },
    MusicCategory { id: "electronic", name: "Electronic", query: "electronic dance music" },
    MusicCategory { id: "rnb", name: "R&B", query: "r&b music hits" },
    MusicCategory { id: "indie", name: "Indie", query: "indie music 2024" },
    MusicCategory { id: "jazz", name: "Jazz", query: "jazz music" },
    MusicCategory { id: "classical", name: "Classical", query: "classical music" },
    MusicCategory { id: "latin", name: "Latin", query: "latin music hits" },
    MusicCategory { id: "kpop", name: "K-Pop", query: "k-pop music 2024" },
    MusicCategory { id: "country", name: "Country", query: "country music hits" },
    MusicCategory { id: "workout", name: "Workout", query: "workout music" },
    MusicCategory { id: "chill", name: "Chill", query: "chill lofi music" },
    MusicCategory { id: "party", name: "Party", query: "party music hits" },
    MusicCategory { id: "focus", name: "Focus", query: "focus study music" },
    MusicCategory { id: "sleep", name: "Sleep", query: "sleep music relaxing" },
];

/// Looks up a browse category by its stable id.
pub fn category_by_id(id: &str) -> Option<&'static MusicCategory> {
    MUSIC_CATEGORIES.iter().find(|c| c.id == id)
}

// ===== Durations =====

/// Parses an ISO 8601 duration as returned by the catalog's
/// `contentDetails.duration` field (e.g. `PT3M20S`, `PT1H2M`, `PT45S`).
///
/// Returns `None` for anything that does not match the `PT[nH][nM][nS]`
/// shape the backend emits. Date components (days, weeks) are not supported.
pub fn parse_iso8601_duration(raw: &str) -> Option<u32> {
    let rest = raw.strip_prefix("PT")?;
    if rest.is_empty() {
        return None;
    }

    let mut total: u32 = 0;
    let mut digits = String::new();
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let value: u32 = digits.parse().ok()?;
        digits.clear();
        let factor = match ch {
            'H' => 3600,
            'M' => 60,
            'S' => 1,
            _ => return None,
        };
        total = total.checked_add(value.checked_mul(factor)?)?;
    }
    if !digits.is_empty() {
        // Trailing digits without a unit marker.
        return None;
    }
    Some(total)
}
