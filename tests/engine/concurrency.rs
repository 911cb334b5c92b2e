use super::support::{CountingImages, Harness, ScriptedNarrative, reply};
use infinite_adventure::AdventureError;
use infinite_adventure::game::OPENING_ACTION;
use infinite_adventure::llm::RetryPolicy;
use std::time::Duration;

fn two_harmless_actions() -> ScriptedNarrative {
    ScriptedNarrative::new()
        .with_reply(
            "use key on barrel",
            reply("You tap the <object>barrel</object>. It sounds hollow.").build(),
        )
        .with_reply(
            "use key on door",
            reply("The <object>door</object> rattles but holds.").build(),
        )
        .with_delay(Duration::from_millis(20))
}

#[tokio::test]
async fn concurrent_actions_on_one_session_are_both_recorded() {
    let h = Harness::new(two_harmless_actions());
    let id = h.engine().start_session().await.unwrap().session_id;

    let (a, b) = tokio::join!(
        h.engine().act(&id, "key", "barrel"),
        h.engine().act(&id, "key", "door"),
    );
    a.unwrap();
    b.unwrap();

    let stored = h.sessions.load(&id).await.unwrap().unwrap();
    assert!(stored.is_balanced());
    assert_eq!(stored.player_turns.len(), 3);
    assert_eq!(stored.player_turns[0], OPENING_ACTION);
    assert!(stored.player_turns.contains(&"use key on barrel".to_string()));
    assert!(stored.player_turns.contains(&"use key on door".to_string()));
}

#[tokio::test]
async fn different_sessions_advance_in_parallel() {
    let h = Harness::new(two_harmless_actions());
    let a = h.engine().start_session().await.unwrap().session_id;
    let b = h.engine().start_session().await.unwrap().session_id;

    let (ra, rb) = tokio::join!(
        h.engine().act(&a, "key", "barrel"),
        h.engine().act(&b, "key", "door"),
    );
    ra.unwrap();
    rb.unwrap();

    for id in [&a, &b] {
        let stored = h.sessions.load(id).await.unwrap().unwrap();
        assert_eq!(stored.player_turns.len(), 2);
        assert!(stored.is_balanced());
    }
}

#[tokio::test]
async fn narrative_timeout_is_retryable_and_stores_nothing() {
    let h = Harness::with_policy(
        ScriptedNarrative::new().with_delay(Duration::from_secs(5)),
        CountingImages::new(),
        RetryPolicy::new(5, 0).with_timeout(Duration::from_millis(30)),
    );

    let err = h.engine().start_session().await.unwrap_err();

    assert!(matches!(
        err,
        AdventureError::GenerationTimeout {
            what: "narrative",
            ..
        }
    ));
    assert!(err.is_retryable());
    assert_eq!(h.sessions.count().await.unwrap(), 0);
    let cached = h.engine().narrator().cache().stats().await.unwrap();
    assert_eq!(cached.entries, 0);
}
