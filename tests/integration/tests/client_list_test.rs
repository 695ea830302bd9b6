//! Client fan-out across several observers of one engine

use anyhow::Result;
use mediacore::player::{ChannelClient, Client, ClientList, MediaPlayer, MediaPlayerEvent, VideoReadyState};
use mediacore::HeadlessMediaPlayer;
use mediacore_integration_tests::{streams, RecordingClient, VIDEO_MIME};
use std::any::Any;
use std::sync::Arc;

#[test]
fn test_clients_receive_in_registration_order() -> Result<()> {
    let list = ClientList::new();
    let first = RecordingClient::new();
    let second = RecordingClient::new();

    list.add_client(first.clone());
    list.add_client(second.clone());
    list.add_client(first.clone());
    assert_eq!(list.len(), 2);

    list.on_ready_state_changed(VideoReadyState::NotAttached, VideoReadyState::HaveNothing);
    list.on_play();

    let expected = vec!["ready_state NotAttached -> HaveNothing", "play"];
    assert_eq!(first.take(), expected);
    assert_eq!(second.take(), expected);

    Ok(())
}

#[test]
fn test_removed_and_dropped_clients() -> Result<()> {
    let list = ClientList::new();
    let kept = RecordingClient::new();
    let removed = RecordingClient::new();
    let dropped = RecordingClient::new();

    list.add_client(kept.clone());
    list.add_client(removed.clone());
    list.add_client(dropped.clone());

    list.remove_client(&*removed);
    assert!(!list.contains(&*removed));

    // The list holds clients weakly.
    drop(dropped);
    assert_eq!(list.len(), 1);

    list.on_seeking();
    assert_eq!(kept.take(), vec!["seeking"]);
    assert!(removed.take().is_empty());

    Ok(())
}

#[test]
fn test_engine_fan_out() -> Result<()> {
    let player = HeadlessMediaPlayer::default();
    let recorder = RecordingClient::new();
    let (channel, events) = ChannelClient::unbounded();
    player.add_client(recorder.clone());
    player.add_client(channel.clone());

    player.attach_mse();
    player.add_mse_buffer(VIDEO_MIME, true, streams::video(30, 10));
    player.loaded_meta_data(10.0);
    let payload = "1080p".to_string();
    let payload: &(dyn Any + Send + Sync) = &payload;
    player.raise_user_event("bitrate_switch", Some(payload));

    // Both clients see the same sequence.
    let from_channel: Vec<String> = events.try_iter().map(|e| e.to_string()).collect();
    let from_recorder = recorder.take();
    assert_eq!(from_channel.len(), from_recorder.len());
    assert_eq!(from_channel[..from_channel.len() - 1], from_recorder[..from_recorder.len() - 1]);
    assert_eq!(from_recorder.last().map(String::as_str), Some("user_event bitrate_switch 1080p"));
    assert_eq!(from_channel.last().map(String::as_str), Some("user_event bitrate_switch"));

    player.remove_client(&*recorder);
    player.detach();
    assert!(recorder.take().is_empty());
    assert!(events.try_iter().any(|e| matches!(e, MediaPlayerEvent::Detach)));

    Ok(())
}

#[test]
fn test_replay_recorded_events() -> Result<()> {
    let player = HeadlessMediaPlayer::default();
    let (channel, events) = ChannelClient::unbounded();
    player.add_client(channel.clone());

    player.attach_mse();
    player.detach();

    // Events captured on a channel can be replayed into any client.
    let replayed = RecordingClient::new();
    for event in events.try_iter() {
        event.dispatch(&*replayed);
    }
    let trace = replayed.take();
    assert_eq!(trace.first().map(String::as_str), Some("attach_mse"));
    assert_eq!(trace.last().map(String::as_str), Some("detach"));

    Ok(())
}

#[test]
fn test_client_registered_through_trait_object() -> Result<()> {
    let player: Arc<dyn MediaPlayer> = Arc::new(HeadlessMediaPlayer::default());
    let recorder = RecordingClient::new();
    player.add_client(recorder.clone());

    assert!(player.attach_mse());
    assert!(recorder.contains("attach_mse"));

    Ok(())
}
