use std::collections::HashSet;

use rand::{Rng, seq::IndexedRandom};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::{game_store::GameStore, storage::StorageResult},
    state::catalog::{GameMode, Playlist, Song},
};

/// Pick a song uniformly among `candidates` that are not in `exclude`.
///
/// Returns `None` once every candidate has been excluded; callers treat that
/// as the end of the playlist and never reset the exclusions.
pub fn select<R: Rng + ?Sized>(
    candidates: &[Uuid],
    exclude: &HashSet<Uuid>,
    rng: &mut R,
) -> Option<Uuid> {
    let mut seen = HashSet::with_capacity(candidates.len());
    let remaining: Vec<Uuid> = candidates
        .iter()
        .copied()
        .filter(|id| !exclude.contains(id) && seen.insert(*id))
        .collect();
    remaining.choose(rng).copied()
}

/// Pick and load a song that can actually be played in `mode`.
///
/// Songs that are missing from the catalog, inactive, or lack the answer the
/// mode asks for are excluded and another pick is made. The number of picks is
/// bounded by the playlist size.
pub async fn select_playable(
    store: &dyn GameStore,
    playlist: &Playlist,
    played: &HashSet<Uuid>,
    mode: GameMode,
) -> StorageResult<Option<Song>> {
    let mut exclude = played.clone();

    for _ in 0..playlist.song_ids.len() {
        let pick = {
            let mut rng = rand::rng();
            select(&playlist.song_ids, &exclude, &mut rng)
        };
        let Some(song_id) = pick else {
            return Ok(None);
        };

        match store.find_song(song_id).await? {
            Some(entity) => {
                let song = Song::from(entity);
                if song.is_playable(mode) {
                    return Ok(Some(song));
                }
                debug!(%song_id, mode = %mode, "skipping song that cannot be played in this mode");
            }
            None => warn!(%song_id, playlist_id = %playlist.id, "playlist references a missing song"),
        }
        exclude.insert(song_id);
    }

    Ok(None)
}
