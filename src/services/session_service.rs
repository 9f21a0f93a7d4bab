//! Session lifecycle: start, serve songs, score answers, expire idle games.
//!
//! Every operation runs under the caller's user gate and ends with a
//! conditional write, so the persisted record stays the single source of truth
//! even when several requests of the same user race.

use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{game_store::GameStore, models::SessionStatusEntity},
    dto::session::{
        NextSongRequest, NextSongResponse, SessionStatusResponse, StartSessionRequest,
        StartSessionResponse, SubmitAnswerRequest, SubmitAnswerResponse,
    },
    error::ServiceError,
    services::{answer_matcher, scoring, session_validator, song_selector, stats_service},
    state::{
        SharedState,
        catalog::{GameMode, Playlist, Song, UnknownGameMode},
        identity::UserId,
        session::{GameSession, Round},
        state_machine::{AbandonReason, SessionEvent},
    },
};

const MAX_TOTAL_ROUNDS: u8 = 20;

/// Start a new game on a playlist, abandoning any other active game of the user.
pub async fn start_session(
    state: &SharedState,
    user: UserId,
    request: StartSessionRequest,
) -> Result<StartSessionResponse, ServiceError> {
    let mode: GameMode = request
        .game_mode
        .parse()
        .map_err(|err: UnknownGameMode| ServiceError::InvalidInput(err.to_string()))?;
    let total_rounds = request
        .total_rounds
        .unwrap_or_else(|| state.config().default_total_rounds());
    if !(1..=MAX_TOTAL_ROUNDS).contains(&total_rounds) {
        return Err(ServiceError::InvalidInput(format!(
            "totalRounds must be between 1 and {MAX_TOTAL_ROUNDS}"
        )));
    }

    let store = state.require_game_store().await?;
    let _gate = state.user_gate(user).await;

    let playlist = load_playlist(&*store, request.playlist_id).await?;
    if !playlist.is_active {
        return Err(ServiceError::InvalidInput(format!(
            "playlist `{}` is not active",
            playlist.id
        )));
    }
    if playlist.song_count() < usize::from(total_rounds) {
        return Err(ServiceError::InvalidInput(format!(
            "playlist `{}` has {} songs but {total_rounds} rounds were requested",
            playlist.id,
            playlist.song_count()
        )));
    }

    let now = SystemTime::now();
    for entity in store
        .find_sessions_by_user(user, SessionStatusEntity::Active)
        .await?
    {
        let mut previous = GameSession::from(entity);
        previous.apply(SessionEvent::Abandon(AbandonReason::Superseded), now)?;
        persist(&*store, &mut previous).await?;
        info!(session_id = %previous.id, user_id = %user, "previous session abandoned");
    }

    let session = GameSession::new(user, playlist.id, mode, total_rounds, now);
    store.insert_session(session.clone().into()).await?;

    info!(
        session_id = %session.id,
        user_id = %user,
        playlist_id = %playlist.id,
        mode = %mode,
        total_rounds,
        "game session started"
    );
    Ok((&session).into())
}

/// Serve the song for the current round.
///
/// An unanswered song is served again instead of drawing a new one. When the
/// playlist runs dry the session is completed and `finished` is set.
pub async fn next_song(
    state: &SharedState,
    user: UserId,
    request: NextSongRequest,
) -> Result<NextSongResponse, ServiceError> {
    let store = state.require_game_store().await?;
    let _gate = state.user_gate(user).await;

    let mut session = session_validator::validate(
        &*store,
        request.game_session_id,
        user,
        &request.client_session_id,
    )
    .await?;
    ensure_active(&session)?;
    let now = SystemTime::now();
    expire_if_idle(state, &*store, &mut session, now).await?;

    if let Some(served) = session.current_song {
        if let Some(song) = load_playable(&*store, served.song_id, session.mode).await? {
            session.touch(now);
            persist(&*store, &mut session).await?;
            return Ok(NextSongResponse {
                finished: false,
                song: Some((&song).into()),
                game_session: (&session).into(),
            });
        }
        warn!(session_id = %session.id, song_id = %served.song_id, "served song is no longer playable");
    }

    let next = if session.all_rounds_played() {
        None
    } else {
        let playlist = load_playlist(&*store, session.playlist_id).await?;
        song_selector::select_playable(&*store, &playlist, &session.played_song_ids(), session.mode)
            .await?
    };

    let Some(song) = next else {
        info!(
            session_id = %session.id,
            rounds = session.completed_rounds(),
            "no songs left; completing session"
        );
        complete(state, &*store, &mut session, now).await?;
        return Ok(NextSongResponse {
            finished: true,
            song: None,
            game_session: (&session).into(),
        });
    };

    session.serve_song(song.id, now);
    session.touch(now);
    persist(&*store, &mut session).await?;

    info!(
        session_id = %session.id,
        song_id = %song.id,
        round = session.current_round(),
        "song served"
    );
    Ok(NextSongResponse {
        finished: false,
        song: Some((&song).into()),
        game_session: (&session).into(),
    })
}

/// Score a guess for the song served in the current round.
pub async fn submit_answer(
    state: &SharedState,
    user: UserId,
    request: SubmitAnswerRequest,
) -> Result<SubmitAnswerResponse, ServiceError> {
    if !(1..=scoring::MAX_HINTS).contains(&request.hints_used) {
        return Err(ServiceError::InvalidInput(format!(
            "hintsUsed must be between 1 and {}",
            scoring::MAX_HINTS
        )));
    }
    if !request.time_to_guess.is_finite() || request.time_to_guess < 0.0 {
        return Err(ServiceError::InvalidInput(
            "timeToGuess must be a non-negative number".into(),
        ));
    }

    let store = state.require_game_store().await?;
    let _gate = state.user_gate(user).await;

    let mut session = session_validator::validate(
        &*store,
        request.game_session_id,
        user,
        &request.client_session_id,
    )
    .await?;
    ensure_active(&session)?;
    let now = SystemTime::now();
    expire_if_idle(state, &*store, &mut session, now).await?;

    if let Some(round_number) = request.round_number {
        let expected = session.completed_rounds() + 1;
        if usize::from(round_number) != expected {
            return Err(ServiceError::InvalidState(format!(
                "round {round_number} is not the current round (expected {expected})"
            )));
        }
    }

    let served = session
        .current_song
        .filter(|served| served.song_id == request.song_id)
        .ok_or_else(|| {
            ServiceError::InvalidState(format!(
                "song `{}` is not the song served for this round",
                request.song_id
            ))
        })?;

    let song: Song = store
        .find_song(request.song_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("song `{}` not found", request.song_id)))?
        .into();
    let correct_answer = song
        .answer_for(session.mode)
        .ok_or_else(|| {
            ServiceError::InvalidState(format!(
                "song `{}` has no {} answer",
                song.id, session.mode
            ))
        })?
        .to_owned();

    let user_guess = request.user_guess.unwrap_or_default();
    let is_correct = answer_matcher::is_match(&user_guess, &correct_answer);
    let round = Round {
        song_id: song.id,
        points_earned: scoring::points(request.hints_used, is_correct),
        user_guess,
        correct_answer,
        is_correct,
        hints_used: request.hints_used,
        time_to_guess: request.time_to_guess,
        started_at: served.served_at,
        ended_at: now,
    };

    session.record_round(round.clone())?;
    session.touch(now);
    info!(
        session_id = %session.id,
        song_id = %round.song_id,
        correct = round.is_correct,
        points = round.points_earned,
        total_score = session.total_score,
        "round submitted"
    );

    if session.all_rounds_played() {
        complete(state, &*store, &mut session, now).await?;
    } else {
        persist(&*store, &mut session).await?;
    }

    Ok(SubmitAnswerResponse {
        round: (&round).into(),
        game_session: (&session).into(),
    })
}

/// Read a session owned by `user`, abandoning it first when it idled out.
pub async fn get_status(
    state: &SharedState,
    user: UserId,
    session_id: Uuid,
) -> Result<SessionStatusResponse, ServiceError> {
    let store = state.require_game_store().await?;
    let _gate = state.user_gate(user).await;

    let mut session = session_validator::load_owned(&*store, session_id, user).await?;
    let now = SystemTime::now();
    if session.is_expired(now, state.config().session_timeout()) {
        let mut abandoned = session.clone();
        abandoned.apply(SessionEvent::Abandon(AbandonReason::IdleTimeout), now)?;
        match persist(&*store, &mut abandoned).await {
            Ok(()) => {
                info!(%session_id, user_id = %user, "idle session abandoned on read");
                session = abandoned;
            }
            Err(err) => warn!(%session_id, error = %err, "failed to abandon idle session on read"),
        }
    }

    Ok((&session).into())
}

fn ensure_active(session: &GameSession) -> Result<(), ServiceError> {
    if session.is_active() {
        return Ok(());
    }
    Err(ServiceError::InvalidState(format!(
        "game session `{}` is not active",
        session.id
    )))
}

/// Abandon and persist a session that idled past the timeout, then report expiry.
async fn expire_if_idle(
    state: &SharedState,
    store: &dyn GameStore,
    session: &mut GameSession,
    now: SystemTime,
) -> Result<(), ServiceError> {
    if !session.is_expired(now, state.config().session_timeout()) {
        return Ok(());
    }

    session.apply(SessionEvent::Abandon(AbandonReason::IdleTimeout), now)?;
    persist(store, session).await?;
    info!(session_id = %session.id, user_id = %session.user_id, "idle session abandoned");
    Err(ServiceError::Expired)
}

/// Close the session as completed and feed it to the statistics.
///
/// Statistics failures are logged and never fail the caller.
async fn complete(
    state: &SharedState,
    store: &dyn GameStore,
    session: &mut GameSession,
    now: SystemTime,
) -> Result<(), ServiceError> {
    session.apply(SessionEvent::Complete, now)?;
    session.touch(now);
    persist(store, session).await?;
    info!(
        session_id = %session.id,
        user_id = %session.user_id,
        score = session.total_score,
        max_score = session.max_possible_score(),
        "game session completed"
    );

    if let Err(err) = stats_service::apply_completed_game(
        store,
        session,
        state.config().win_threshold_percent(),
    )
    .await
    {
        warn!(session_id = %session.id, error = %err, "failed to update user statistics");
    }
    Ok(())
}

/// Write the session back, conditional on the version it was loaded with.
async fn persist(store: &dyn GameStore, session: &mut GameSession) -> Result<(), ServiceError> {
    let expected = session.version;
    session.version = expected + 1;
    store.update_session(session.clone().into(), expected).await?;
    Ok(())
}

async fn load_playlist(store: &dyn GameStore, id: Uuid) -> Result<Playlist, ServiceError> {
    store
        .find_playlist(id)
        .await?
        .map(Playlist::from)
        .ok_or_else(|| ServiceError::NotFound(format!("playlist `{id}` not found")))
}

async fn load_playable(
    store: &dyn GameStore,
    song_id: Uuid,
    mode: GameMode,
) -> Result<Option<Song>, ServiceError> {
    Ok(store
        .find_song(song_id)
        .await?
        .map(Song::from)
        .filter(|song| song.is_playable(mode)))
}
