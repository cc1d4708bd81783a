//! Engine events raised from other threads while a session attaches,
//! forwards or detaches

mod helpers;

use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

use helpers::Recorder;
use mirror_bridge::engine::{
    EngineLoop, MediaTrack, MediaType, NativeEntity, Player, Quality, TextTrack, TextTrackCue,
};
use mirror_bridge::MirrorSession;
use mirror_common::protocol::RemoteCall;
use mirror_common::PlayerId;
use serde_json::json;

fn attach(player: &Arc<Player>, recorder: &Recorder) -> (MirrorSession, EngineLoop) {
    let (engine, engine_loop) = EngineLoop::new(player.clone());
    let session = MirrorSession::attach(player.clone(), engine, recorder.transport.clone());
    (session, engine_loop)
}

fn cue(i: usize) -> Arc<TextTrackCue> {
    let start = i as f64;
    Arc::new(TextTrackCue::new(
        format!("cue-{}", i),
        start,
        start + 0.5,
        json!({ "text": i }),
    ))
}

#[test]
fn test_attach_while_tracks_are_added() {
    for _ in 0..20 {
        let mut recorder = Recorder::new();
        let player = Arc::new(Player::new(PlayerId(1)));
        let barrier = Arc::new(Barrier::new(2));

        let adder = {
            let player = player.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..50 {
                    let track = MediaTrack::new(MediaType::Audio, format!("a{}", i), "", "en")
                        .with_qualities(vec![
                            Quality::new("lo", "Low", 64_000),
                            Quality::new("hi", "High", 192_000),
                        ]);
                    player.audio_tracks().add(Arc::new(track));
                }
            })
        };

        barrier.wait();
        let (session, _engine_loop) = attach(&player, &recorder);
        adder.join().unwrap();

        let mut announced: HashMap<String, usize> = HashMap::new();
        for call in recorder.calls() {
            if let RemoteCall::AddTrack(payload) = call {
                *announced.entry(payload.id).or_default() += 1;
            }
        }
        assert_eq!(announced.len(), 50);
        assert!(announced.values().all(|count| *count == 1), "{:?}", announced);
        assert_eq!(session.registry().len(), 150);
    }
}

#[test]
fn test_cue_events_racing_text_track_removal() {
    for _ in 0..200 {
        let mut recorder = Recorder::new();
        let player = Arc::new(Player::new(PlayerId(1)));
        let (session, _engine_loop) = attach(&player, &recorder);
        let track = Arc::new(TextTrack::new("t1", "English", "en", "subtitles"));
        let barrier = Arc::new(Barrier::new(2));

        let cues = {
            let track = track.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..50 {
                    let cue = cue(i);
                    track.cues().add(cue.clone());
                    track.enter_cue(&cue);
                    cue.update(i as f64 + 1.0, json!({ "text": "updated" }));
                }
            })
        };

        barrier.wait();
        player.text_tracks().add(track.clone());
        player.text_tracks().remove(track.native_id());
        cues.join().unwrap();

        let methods = recorder.methods();
        assert_eq!(methods.first(), Some(&"onAddTextTrack"));
        assert_eq!(methods.last(), Some(&"onRemoveTextTrack"), "{:?}", methods);
        assert_eq!(
            methods.iter().filter(|m| **m == "onRemoveTextTrack").count(),
            1
        );
        assert!(session.registry().is_empty());
    }
}

#[test]
fn test_detach_while_tracks_come_and_go() {
    for _ in 0..20 {
        let mut recorder = Recorder::new();
        let player = Arc::new(Player::new(PlayerId(1)));
        let (session, _engine_loop) = attach(&player, &recorder);
        let barrier = Arc::new(Barrier::new(2));

        let churn = {
            let player = player.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for round in 0..100 {
                    let track = Arc::new(TextTrack::new(
                        format!("t{}", round),
                        "English",
                        "en",
                        "subtitles",
                    ));
                    let cues: Vec<_> = (0..3).map(cue).collect();
                    for cue in &cues {
                        track.cues().add(cue.clone());
                    }
                    player.text_tracks().add(track.clone());
                    track.enter_cue(&cues[0]);
                    player.text_tracks().remove(track.native_id());
                }
            })
        };

        barrier.wait();
        session.detach();
        recorder.calls();
        churn.join().unwrap();

        assert!(recorder.calls().is_empty());
        assert!(session.registry().is_empty());
    }
}
