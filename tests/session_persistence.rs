mod common;

use uplevel::error::{is_not_authenticated, is_not_found};
use uplevel::providers::Message;
use uplevel::session::{SessionStore, DEFAULT_SESSION_NAME};

#[test]
fn test_transcript_survives_reopen() {
    let (store, tmp) = common::create_temp_store();
    let session = store
        .create_session("alice", DEFAULT_SESSION_NAME, None)
        .unwrap();

    let transcript = vec![
        Message::user("How do I give feedback?"),
        Message::assistant("Start with observed behavior."),
    ];
    store
        .append_exchange("alice", &session.id, &transcript)
        .unwrap();
    drop(store);

    // A second store over the same file sees the same data
    let reopened = SessionStore::new_with_path(tmp.path().join("sessions.db")).unwrap();
    let history = reopened.get_history("alice", &session.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "How do I give feedback?");
    assert_eq!(history[1].content, "Start with observed behavior.");
}

#[test]
fn test_exchanges_accumulate_in_order() {
    let (store, _tmp) = common::create_temp_store();
    let session = store
        .create_session("alice", DEFAULT_SESSION_NAME, None)
        .unwrap();

    let mut transcript = vec![
        Message::user("one"),
        Message::assistant("first answer"),
    ];
    store
        .append_exchange("alice", &session.id, &transcript)
        .unwrap();

    transcript.push(Message::user("two"));
    transcript.push(Message::assistant("second answer"));
    store
        .append_exchange("alice", &session.id, &transcript)
        .unwrap();

    let history = store.get_history("alice", &session.id).unwrap();
    let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        contents,
        vec!["one", "first answer", "two", "second answer"]
    );
}

#[test]
fn test_list_orders_by_creation() {
    let (store, _tmp) = common::create_temp_store();
    let a = store.create_session("alice", "alpha", None).unwrap();
    let b = store.create_session("alice", "beta", None).unwrap();
    let c = store.create_session("alice", "gamma", None).unwrap();

    let ids: Vec<String> = store
        .list_sessions("alice")
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![a.id, b.id, c.id]);
}

#[test]
fn test_cross_user_access_is_not_found() {
    let (store, _tmp) = common::create_temp_store();
    let session = store
        .create_session("alice", DEFAULT_SESSION_NAME, None)
        .unwrap();

    let err = store.get_history("mallory", &session.id).unwrap_err();
    assert!(is_not_found(&err));

    let err = store
        .append_exchange("mallory", &session.id, &[Message::user("hi")])
        .unwrap_err();
    assert!(is_not_found(&err));

    let err = store.rename("mallory", &session.id, "stolen").unwrap_err();
    assert!(is_not_found(&err));

    // Deleting someone else's session is a silent no-op
    store.delete_session("mallory", &session.id).unwrap();
    assert_eq!(store.list_sessions("alice").unwrap().len(), 1);
}

#[test]
fn test_empty_user_is_rejected_everywhere() {
    let (store, _tmp) = common::create_temp_store();

    let err = store.list_sessions("  ").unwrap_err();
    assert!(is_not_authenticated(&err));

    let err = store
        .create_session("", DEFAULT_SESSION_NAME, None)
        .unwrap_err();
    assert!(is_not_authenticated(&err));
}

#[test]
fn test_rename_persists() {
    let (store, _tmp) = common::create_temp_store();
    let session = store
        .create_session("alice", DEFAULT_SESSION_NAME, None)
        .unwrap();

    store
        .rename("alice", &session.id, "Quarterly goals")
        .unwrap();

    let sessions = store.list_sessions("alice").unwrap();
    assert_eq!(sessions[0].name, "Quarterly goals");
    assert!(!sessions[0].has_default_name());
}
