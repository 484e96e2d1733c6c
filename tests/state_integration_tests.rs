//! Integration tests for StateManager with state change events
//!
//! These tests verify that the StateManager correctly:
//! - Emits one PropertyChanged event per edited field
//! - Notifies synchronous property observers
//! - Replaces the whole document on open
//! - Handles concurrent access from multiple tasks

use camino::Utf8PathBuf;
use preloader_configurator::{PreloaderConfig, Property, StateChange, StateManager};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, timeout};

fn parsed(xml: &str) -> PreloaderConfig {
    PreloaderConfig::from_xml(xml).unwrap()
}

#[tokio::test]
async fn test_field_edit_emits_property_event() {
    let state = StateManager::new();
    let mut rx = state.subscribe();

    state.update_config(|config| config.hook_delay = 200);

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");

    assert_eq!(event, StateChange::PropertyChanged(Property::HookDelay));
    assert!(rx.try_recv().is_err(), "only one event expected");
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let state = StateManager::new();
    let mut rx1 = state.subscribe();
    let mut rx2 = state.subscribe();

    state.set_process_allowed("oblivion.exe", true);

    for rx in [&mut rx1, &mut rx2] {
        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout waiting for event")
            .expect("Channel closed");
        assert_eq!(event, StateChange::PropertyChanged(Property::ProcessAllowed(5)));
    }
}

#[tokio::test]
async fn test_open_replaces_document_and_notifies_bindings() {
    let state = StateManager::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for property in [Property::Config, Property::CurrentFilePath, Property::LoadDelay] {
        let seen = Arc::clone(&seen);
        state.observers().subscribe(property, move |p| seen.lock().unwrap().push(p));
    }

    let first = Utf8PathBuf::from("/games/first.xml");
    state.replace_document(
        first.clone(),
        parsed("<xSE><PluginPreloader><LoadDelay>10</LoadDelay></PluginPreloader></xSE>"),
    );

    {
        let seen = seen.lock().unwrap();
        assert!(seen.contains(&Property::Config));
        assert!(seen.contains(&Property::CurrentFilePath));
        assert!(seen.contains(&Property::LoadDelay));
    }
    seen.lock().unwrap().clear();

    // Same values in a second file still count as a new document
    let second = Utf8PathBuf::from("/games/second.xml");
    let mut rx = state.subscribe();
    state.replace_document(
        second.clone(),
        parsed("<xSE><PluginPreloader><LoadDelay>10</LoadDelay></PluginPreloader></xSE>"),
    );

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Property::CurrentFilePath, Property::Config]
    );

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.last(), Some(&StateChange::DocumentOpened { path: second }));
}

#[tokio::test]
async fn test_observer_unsubscribe_stops_notifications() {
    let state = StateManager::new();
    let hits = Arc::new(AtomicUsize::new(0));

    let hits_clone = Arc::clone(&hits);
    let id = state
        .observers()
        .subscribe(Property::ThreadNumber, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

    state.update_config(|config| config.thread_number = "4".to_string());
    assert!(state.observers().unsubscribe(id));
    state.update_config(|config| config.thread_number = "8".to_string());

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_state_access() {
    let state = Arc::new(StateManager::new());

    // Spawn multiple tasks that update state concurrently
    let mut handles = vec![];

    for i in 0..10 {
        let state_clone = state.clone();
        let handle = tokio::spawn(async move {
            state_clone.update_config(|config| config.load_delay = i);
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    // Last write wins
    let final_delay = state.read(|s| s.config.load_delay);
    assert!((0..10).contains(&final_delay), "Delay should be within range");
    assert_eq!(state.read(|s| s.config.processes().len()), 11);
}
