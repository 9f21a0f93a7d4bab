use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use song_guess_back::{
    config::AppConfig,
    dao::{
        game_store::{CatalogSeed, GameStore, memory::InMemoryGameStore, seed_catalog},
        models::{PlaylistEntity, SessionStatusEntity, SongEntity, UserStatsEntity},
    },
    routes,
    state::{AppState, identity::UserId},
};

struct TestApp {
    app: Router,
    store: InMemoryGameStore,
    playlist_id: Uuid,
    titles: HashMap<Uuid, String>,
}

fn song(title: &str, artist: &str) -> SongEntity {
    let id = Uuid::new_v4();
    SongEntity {
        id,
        title: Some(title.into()),
        artist: Some(artist.into()),
        media_url: format!("https://media.example/{id}"),
        media_track_id: Some(format!("track-{id}")),
        starting_offset: 15,
        difficulty: Some("easy".into()),
        is_active: true,
    }
}

async fn test_app(config: AppConfig, songs: Vec<SongEntity>) -> TestApp {
    let store = InMemoryGameStore::new();
    let playlist_id = Uuid::new_v4();
    let titles = songs
        .iter()
        .filter_map(|song| song.title.clone().map(|title| (song.id, title)))
        .collect();

    let catalog = CatalogSeed {
        playlists: vec![PlaylistEntity {
            id: playlist_id,
            name: "test playlist".into(),
            song_ids: songs.iter().map(|song| song.id).collect(),
            is_active: true,
        }],
        songs,
    };
    seed_catalog(&store, catalog).await.unwrap();

    let state = AppState::with_store(config, Arc::new(store.clone())).await;
    TestApp {
        app: routes::router(state),
        store,
        playlist_id,
        titles,
    }
}

fn classic_songs() -> Vec<SongEntity> {
    vec![
        song("Time", "Pink Floyd"),
        song("Bohemian Rhapsody", "Queen"),
        song("Hey Jude", "The Beatles"),
        song("Imagine", "John Lennon"),
        song("Hotel California", "Eagles"),
        song("Smells Like Teen Spirit", "Nirvana"),
        song("Billie Jean", "Michael Jackson"),
        song("Wonderwall", "Oasis"),
        song("Purple Rain", "Prince"),
        song("Take On Me", "a-ha"),
    ]
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let res = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn start(app: &TestApp, user: &str, rounds: u8) -> (Uuid, String) {
    start_in_mode(app, user, "classic", rounds).await
}

async fn start_in_mode(app: &TestApp, user: &str, mode: &str, rounds: u8) -> (Uuid, String) {
    let (status, body) = call(
        &app.app,
        Method::POST,
        "/game-sessions",
        Some(user),
        Some(json!({
            "playlistId": app.playlist_id,
            "gameMode": mode,
            "totalRounds": rounds,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    let id = body["data"]["id"].as_str().unwrap().parse().unwrap();
    let nonce = body["data"]["clientSessionId"].as_str().unwrap().to_owned();
    (id, nonce)
}

async fn next_song(app: &TestApp, user: &str, session: Uuid, nonce: &str) -> (StatusCode, Value) {
    call(
        &app.app,
        Method::POST,
        "/game-sessions/next-song",
        Some(user),
        Some(json!({"gameSessionId": session, "clientSessionId": nonce})),
    )
    .await
}

async fn submit(
    app: &TestApp,
    user: &str,
    session: Uuid,
    nonce: &str,
    song_id: Uuid,
    guess: &str,
    hints: u8,
) -> (StatusCode, Value) {
    call(
        &app.app,
        Method::POST,
        "/game-sessions/submit",
        Some(user),
        Some(json!({
            "gameSessionId": session,
            "songId": song_id,
            "userGuess": guess,
            "hintsUsed": hints,
            "timeToGuess": 4.5,
            "clientSessionId": nonce,
        })),
    )
    .await
}

fn served_song_id(body: &Value) -> Uuid {
    body["data"]["song"]["id"].as_str().unwrap().parse().unwrap()
}

async fn status_of(app: &TestApp, user: &str, session: Uuid) -> Value {
    let (status, body) = call(
        &app.app,
        Method::GET,
        &format!("/game-sessions/{session}"),
        Some(user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"].clone()
}

#[tokio::test]
async fn five_round_classic_game_reaches_a_perfect_score() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let user = Uuid::new_v4().to_string();
    let (session, nonce) = start(&app, &user, 5).await;

    let mut served = Vec::new();
    let mut last = Value::Null;
    for round in 1..=5 {
        let (status, body) = next_song(&app, &user, session, &nonce).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["finished"], false);
        assert_eq!(body["data"]["gameSession"]["currentRound"], round);
        assert!(body["data"]["song"]["title"].is_null());

        let song_id = served_song_id(&body);
        assert!(!served.contains(&song_id), "song served twice");
        served.push(song_id);

        let (status, body) =
            submit(&app, &user, session, &nonce, song_id, &app.titles[&song_id], 1).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["round"]["isCorrect"], true);
        assert_eq!(body["data"]["round"]["pointsEarned"], 5);
        last = body;
    }

    assert_eq!(last["data"]["gameSession"]["totalScore"], 25);
    assert_eq!(last["data"]["gameSession"]["isComplete"], true);
    assert_eq!(last["data"]["gameSession"]["currentRound"], 6);
    assert_eq!(last["data"]["gameSession"]["status"], "completed");

    let view = status_of(&app, &user, session).await;
    assert_eq!(view["status"], "completed");
    assert_eq!(view["totalScore"], 25);
    assert_eq!(view["maxPossibleScore"], 25);
    assert_eq!(view["completedRounds"], 5);
    assert_eq!(view["currentRound"], 6);
    assert_eq!(view["accuracy"], 100.0);
    assert_eq!(view["averageHintsUsed"], 1.0);
    assert!(view["sessionEndTime"].is_string());
    assert!(view["totalGameTime"].is_u64());

    let (status, stats) = call(&app.app, Method::GET, "/users/me/stats", Some(user.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data"]["gamesPlayed"], 1);
    assert_eq!(stats["data"]["gamesWon"], 1);
    assert_eq!(stats["data"]["bestScore"], 25);
    assert_eq!(stats["data"]["averageScore"], 25.0);
}

#[tokio::test]
async fn bracketed_guess_matches_plain_title_with_one_point_after_five_hints() {
    let app = test_app(AppConfig::default(), vec![song("Time", "Pink Floyd")]).await;
    let user = Uuid::new_v4().to_string();
    let (session, nonce) = start(&app, &user, 1).await;

    let (_, body) = next_song(&app, &user, session, &nonce).await;
    let song_id = served_song_id(&body);

    let (status, body) = submit(&app, &user, session, &nonce, song_id, "time (remaster)", 5).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["round"]["isCorrect"], true);
    assert_eq!(body["data"]["round"]["correctAnswer"], "Time");
    assert_eq!(body["data"]["round"]["pointsEarned"], 1);
    assert_eq!(body["data"]["round"]["hintsUsed"], 5);
}

#[tokio::test]
async fn wrong_guess_scores_nothing() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let user = Uuid::new_v4().to_string();
    let (session, nonce) = start(&app, &user, 2).await;

    let (_, body) = next_song(&app, &user, session, &nonce).await;
    let (status, body) = submit(
        &app,
        &user,
        session,
        &nonce,
        served_song_id(&body),
        "Never Gonna Give You Up",
        1,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["round"]["isCorrect"], false);
    assert_eq!(body["data"]["round"]["pointsEarned"], 0);
    assert_eq!(body["data"]["gameSession"]["currentRound"], 2);
    assert_eq!(body["data"]["gameSession"]["status"], "active");
}

#[tokio::test]
async fn starting_twice_leaves_exactly_one_active_session() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let user = Uuid::new_v4().to_string();

    let (first, _) = start(&app, &user, 3).await;
    let (second, _) = start(&app, &user, 3).await;

    assert_eq!(status_of(&app, &user, first).await["status"], "abandoned");
    assert_eq!(status_of(&app, &user, second).await["status"], "active");

    let owner = UserId::from_raw(&user).unwrap();
    let active = GameStore::find_sessions_by_user(&app.store, owner, SessionStatusEntity::Active)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second);
}

#[tokio::test]
async fn idle_session_expires_and_stays_abandoned() {
    let config = AppConfig::default().with_session_timeout(Duration::from_millis(10));
    let app = test_app(config, classic_songs()).await;
    let user = Uuid::new_v4().to_string();
    let (session, nonce) = start(&app, &user, 3).await;

    tokio::time::sleep(Duration::from_millis(30)).await;

    let (status, body) = next_song(&app, &user, session, &nonce).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["success"], false);

    let stored = GameStore::find_session(&app.store, session)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SessionStatusEntity::Abandoned);
    assert!(stored.session_end_time.is_none());

    let (status, _) = next_song(&app, &user, session, &nonce).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reading_an_idle_session_abandons_it() {
    let config = AppConfig::default().with_session_timeout(Duration::from_millis(10));
    let app = test_app(config, classic_songs()).await;
    let user = Uuid::new_v4().to_string();
    let (session, _) = start(&app, &user, 3).await;

    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(status_of(&app, &user, session).await["status"], "abandoned");
}

#[tokio::test]
async fn foreign_users_and_wrong_nonces_are_forbidden() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let user = Uuid::new_v4().to_string();
    let intruder = Uuid::new_v4().to_string();
    let (session, nonce) = start(&app, &user, 3).await;

    let (status, wrong_nonce) = next_song(&app, &user, session, "forged-nonce").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, foreign) = next_song(&app, &intruder, session, &nonce).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(wrong_nonce, foreign);

    let (status, _) = call(
        &app.app,
        Method::GET,
        &format!("/game-sessions/{session}"),
        Some(intruder.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let user = Uuid::new_v4().to_string();

    let (status, body) = next_song(&app, &user, Uuid::new_v4(), "nonce").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn identity_header_is_required_and_normalized() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let body = json!({"playlistId": app.playlist_id, "gameMode": "classic", "totalRounds": 2});

    let (status, _) = call(&app.app, Method::POST, "/game-sessions", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(
        &app.app,
        Method::POST,
        "/game-sessions",
        Some("not-a-user"),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = Uuid::new_v4();
    let buffer = json!({"type": "Buffer", "data": user.as_bytes().to_vec()}).to_string();
    let (status, created) =
        call(&app.app, Method::POST, "/game-sessions", Some(buffer.as_str()), Some(body)).await;
    assert_eq!(status, StatusCode::OK, "{created}");

    let session: Uuid = created["data"]["id"].as_str().unwrap().parse().unwrap();
    let view = status_of(&app, &user.to_string(), session).await;
    assert_eq!(view["userId"], user.to_string());
}

#[tokio::test]
async fn repeated_next_song_serves_the_same_song() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let user = Uuid::new_v4().to_string();
    let (session, nonce) = start(&app, &user, 3).await;

    let (_, first) = next_song(&app, &user, session, &nonce).await;
    let (_, again) = next_song(&app, &user, session, &nonce).await;
    assert_eq!(served_song_id(&first), served_song_id(&again));
    assert_eq!(again["data"]["gameSession"]["currentRound"], 1);
}

#[tokio::test]
async fn submit_only_accepts_the_served_song_once() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let user = Uuid::new_v4().to_string();
    let (session, nonce) = start(&app, &user, 3).await;

    let (_, body) = next_song(&app, &user, session, &nonce).await;
    let song_id = served_song_id(&body);

    let (status, _) = submit(&app, &user, session, &nonce, Uuid::new_v4(), "anything", 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = submit(&app, &user, session, &nonce, song_id, "anything", 1).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = submit(&app, &user, session, &nonce, song_id, "anything", 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let view = status_of(&app, &user, session).await;
    assert_eq!(view["completedRounds"], 1);
}

#[tokio::test]
async fn stale_round_number_is_rejected() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let user = Uuid::new_v4().to_string();
    let (session, nonce) = start(&app, &user, 3).await;

    let (_, body) = next_song(&app, &user, session, &nonce).await;
    let song_id = served_song_id(&body);

    let mut request = json!({
        "gameSessionId": session,
        "songId": song_id,
        "userGuess": "x",
        "hintsUsed": 1,
        "timeToGuess": 1.0,
        "clientSessionId": nonce,
        "roundNumber": 2,
    });
    let (status, _) = call(
        &app.app,
        Method::POST,
        "/game-sessions/submit",
        Some(user.as_str()),
        Some(request.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    request["roundNumber"] = json!(1);
    let (status, _) = call(
        &app.app,
        Method::POST,
        "/game-sessions/submit",
        Some(user.as_str()),
        Some(request),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_submissions_are_rejected_before_touching_the_session() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let user = Uuid::new_v4().to_string();
    let (session, nonce) = start(&app, &user, 3).await;
    let (_, body) = next_song(&app, &user, session, &nonce).await;
    let song_id = served_song_id(&body);

    let (status, body) = submit(&app, &user, session, &nonce, song_id, "Time", 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = call(
        &app.app,
        Method::POST,
        "/game-sessions/submit",
        Some(user.as_str()),
        Some(json!({"gameSessionId": session, "songId": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(status_of(&app, &user, session).await["completedRounds"], 0);
}

#[tokio::test]
async fn start_checks_the_playlist() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let user = Uuid::new_v4().to_string();

    let (status, _) = call(
        &app.app,
        Method::POST,
        "/game-sessions",
        Some(user.as_str()),
        Some(json!({"playlistId": Uuid::new_v4(), "gameMode": "classic"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app.app,
        Method::POST,
        "/game-sessions",
        Some(user.as_str()),
        Some(json!({"playlistId": app.playlist_id, "gameMode": "classic", "totalRounds": 11})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app.app,
        Method::POST,
        "/game-sessions",
        Some(user.as_str()),
        Some(json!({"playlistId": app.playlist_id, "gameMode": "lyrics"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn exhausted_playlist_completes_the_session() {
    let mut songs = vec![
        song("Time", "Pink Floyd"),
        song("Money", "Pink Floyd"),
        song("Breathe", "Pink Floyd"),
    ];
    songs[2].is_active = false;
    let app = test_app(AppConfig::default(), songs).await;
    let user = Uuid::new_v4().to_string();
    let (session, nonce) = start(&app, &user, 3).await;

    for _ in 0..2 {
        let (_, body) = next_song(&app, &user, session, &nonce).await;
        let song_id = served_song_id(&body);
        let (status, _) =
            submit(&app, &user, session, &nonce, song_id, &app.titles[&song_id], 2).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = next_song(&app, &user, session, &nonce).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["finished"], true);
    assert!(body["data"]["song"].is_null());
    assert_eq!(body["data"]["gameSession"]["status"], "completed");
    assert_eq!(body["data"]["gameSession"]["totalScore"], 8);

    let (_, stats) = call(&app.app, Method::GET, "/users/me/stats", Some(user.as_str()), None).await;
    assert_eq!(stats["data"]["gamesPlayed"], 1);
    assert_eq!(stats["data"]["gamesWon"], 0);
}

#[tokio::test]
async fn recompute_repairs_drifted_statistics() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let user = Uuid::new_v4().to_string();
    let (session, nonce) = start(&app, &user, 1).await;
    let (_, body) = next_song(&app, &user, session, &nonce).await;
    let song_id = served_song_id(&body);
    submit(&app, &user, session, &nonce, song_id, &app.titles[&song_id], 3).await;

    let owner = UserId::from_raw(&user).unwrap();
    let mut drifted = UserStatsEntity::empty(owner);
    drifted.games_played = 40;
    drifted.total_score = 1;
    GameStore::save_user_stats(&app.store, drifted).await.unwrap();

    let (status, body) = call(
        &app.app,
        Method::POST,
        "/users/me/stats/recompute",
        Some(user.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["gamesPlayed"], 1);
    assert_eq!(body["data"]["gamesWon"], 1);
    assert_eq!(body["data"]["totalScore"], 3);
    assert_eq!(body["data"]["bestScore"], 3);
}

#[tokio::test]
async fn healthcheck_reports_ok_with_a_store() {
    let app = test_app(AppConfig::default(), classic_songs()).await;
    let (status, body) = call(&app.app, Method::GET, "/healthcheck", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn artist_game_matches_the_artist_and_skips_songs_without_one() {
    let mut songs = vec![
        song("Time", "Pink Floyd"),
        song("Hey Jude", "The Beatles"),
        song("Imagine", "John Lennon"),
        song("Anonymous Demo", "unused"),
    ];
    songs[3].artist = None;
    let unattributed = songs[3].id;
    let artists: HashMap<Uuid, String> = songs
        .iter()
        .filter_map(|song| song.artist.clone().map(|artist| (song.id, artist)))
        .collect();

    let app = test_app(AppConfig::default(), songs).await;
    let user = Uuid::new_v4().to_string();
    let (session, nonce) = start_in_mode(&app, &user, "artist", 3).await;

    for round in 1..=3 {
        let (status, body) = next_song(&app, &user, session, &nonce).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert!(body["data"]["song"]["artist"].is_null());
        let song_id = served_song_id(&body);
        assert_ne!(song_id, unattributed);

        if round == 1 {
            let (_, body) =
                submit(&app, &user, session, &nonce, song_id, &app.titles[&song_id], 1).await;
            assert_eq!(body["data"]["round"]["isCorrect"], false);
            assert_eq!(body["data"]["round"]["correctAnswer"], artists[&song_id].as_str());
        } else {
            let (_, body) =
                submit(&app, &user, session, &nonce, song_id, &artists[&song_id], 2).await;
            assert_eq!(body["data"]["round"]["isCorrect"], true);
            assert_eq!(body["data"]["round"]["pointsEarned"], 4);
        }
    }

    let view = status_of(&app, &user, session).await;
    assert_eq!(view["gameMode"], "artist");
    assert_eq!(view["status"], "completed");
    assert_eq!(view["totalScore"], 8);
}
