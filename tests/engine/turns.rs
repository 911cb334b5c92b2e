use super::support::{Harness, ScriptedNarrative, opening_reply, reply};
use infinite_adventure::AdventureError;
use infinite_adventure::game::OPENING_ACTION;

#[tokio::test]
async fn start_plays_the_opening_turn() {
    let h = Harness::new(ScriptedNarrative::new());

    let started = h.engine().start_session().await.unwrap();

    assert!(started.outcome.new_scene);
    assert!(started.outcome.story_text.starts_with("You wake in a cellar."));
    assert_eq!(started.outcome.objects, vec!["barrel", "door"]);
    assert_eq!(started.outcome.inventory, vec!["key"]);
    let url = started.outcome.image_url.unwrap();
    assert!(url.starts_with("image/"));
    assert!(url.ends_with(&format!(".png?session={}", started.session_id)));

    let stored = h.sessions.load(&started.session_id).await.unwrap().unwrap();
    assert_eq!(stored.player_turns, vec![OPENING_ACTION]);
    assert_eq!(stored.assistant_turns, vec![opening_reply()]);
    assert!(stored.is_balanced());
    assert_eq!(stored.pending_image_prompts.len(), 1);
}

#[tokio::test]
async fn identical_histories_are_narrated_once() {
    let h = Harness::new(
        ScriptedNarrative::new()
            .with_reply("use key on door", reply("The <object>door</object> creaks.").build()),
    );

    let a = h.engine().start_session().await.unwrap();
    let b = h.engine().start_session().await.unwrap();
    assert_ne!(a.session_id, b.session_id);
    assert_eq!(a.outcome.story_text, b.outcome.story_text);
    assert_eq!(a.outcome.objects, b.outcome.objects);
    assert_eq!(h.narrative.calls(), 1);

    let after_a = h.engine().act(&a.session_id, "key", "door").await.unwrap();
    let after_b = h.engine().act(&b.session_id, "key", "door").await.unwrap();
    assert_eq!(after_a, after_b);
    assert_eq!(h.narrative.calls(), 2);
}

#[tokio::test]
async fn no_progress_rolls_the_action_back() {
    let h = Harness::new(ScriptedNarrative::new().with_reply(
        "use key on barrel",
        reply("The key scrapes uselessly against the barrel.")
            .no_progress()
            .build(),
    ));
    let started = h.engine().start_session().await.unwrap();

    let outcome = h
        .engine()
        .act(&started.session_id, "key", "barrel")
        .await
        .unwrap();

    assert_eq!(outcome.story_text, "The key scrapes uselessly against the barrel.");
    assert_eq!(outcome.objects, vec!["barrel", "door"]);
    assert_eq!(outcome.inventory, vec!["key"]);

    let stored = h.sessions.load(&started.session_id).await.unwrap().unwrap();
    assert_eq!(stored.player_turns, vec![OPENING_ACTION]);
    assert_eq!(stored.assistant_turns.len(), 1);
    assert!(stored.is_balanced());

    // Rolled back, so repeating the action replays a cached history.
    h.engine()
        .act(&started.session_id, "key", "barrel")
        .await
        .unwrap();
    assert_eq!(h.narrative.calls(), 2);
}

#[tokio::test]
async fn snapshot_keeps_the_last_story_that_stuck() {
    let h = Harness::new(ScriptedNarrative::new().with_reply(
        "use key on barrel",
        reply("Nothing.").no_progress().build(),
    ));
    let started = h.engine().start_session().await.unwrap();
    h.engine()
        .act(&started.session_id, "key", "barrel")
        .await
        .unwrap();

    let snapshot = h.engine().snapshot(&started.session_id).await.unwrap();

    assert_eq!(snapshot.story_text, started.outcome.story_text);
    assert_eq!(snapshot.objects, started.outcome.objects);
    assert_eq!(snapshot.image_url, None);
    assert!(!snapshot.new_scene);
}

#[tokio::test]
async fn new_scene_replaces_objects() {
    let h = Harness::new(ScriptedNarrative::new().with_reply(
        "use key on door",
        reply("You step into a <object>garden</object> beside a <object>well</object>.")
            .new_scene()
            .build(),
    ));
    let started = h.engine().start_session().await.unwrap();

    let outcome = h.engine().act(&started.session_id, "key", "door").await.unwrap();

    assert!(outcome.new_scene);
    assert_eq!(outcome.objects, vec!["garden", "well"]);
}

#[tokio::test]
async fn same_scene_adds_from_text_then_subtracts_removed() {
    let h = Harness::new(ScriptedNarrative::new().with_reply(
        "use key on door",
        reply("The <object>door</object> bursts apart, revealing a <object>stair</object>.")
            .removes_objects(&["door"])
            .build(),
    ));
    let started = h.engine().start_session().await.unwrap();

    let outcome = h.engine().act(&started.session_id, "key", "door").await.unwrap();

    assert!(!outcome.new_scene);
    assert_eq!(outcome.objects, vec!["barrel", "stair"]);
}

#[tokio::test]
async fn inventory_gains_and_losses_apply() {
    let h = Harness::new(ScriptedNarrative::new().with_reply(
        "use key on barrel",
        reply("The key snaps in the lock, but you pry out a <item>lantern</item>.")
            .gains(&["lantern", "coin"])
            .loses(&["key"])
            .build(),
    ));
    let started = h.engine().start_session().await.unwrap();

    let outcome = h
        .engine()
        .act(&started.session_id, "key", "barrel")
        .await
        .unwrap();

    assert_eq!(outcome.inventory, vec!["coin", "lantern"]);
}

#[tokio::test]
async fn guard_rejects_missing_item_without_calling_the_model() {
    let h = Harness::new(ScriptedNarrative::new());
    let started = h.engine().start_session().await.unwrap();
    let before = h.sessions.load(&started.session_id).await.unwrap().unwrap();

    let outcome = h
        .engine()
        .act(&started.session_id, "sword", "door")
        .await
        .unwrap();

    assert_eq!(outcome.story_text, "You have no sword.");
    assert_eq!(outcome.image_url, None);
    assert!(!outcome.new_scene);
    assert_eq!(outcome.inventory, vec!["key"]);
    assert_eq!(h.narrative.calls(), 1);
    let after = h.sessions.load(&started.session_id).await.unwrap().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn guard_rejects_absent_object() {
    let h = Harness::new(ScriptedNarrative::new());
    let started = h.engine().start_session().await.unwrap();

    let outcome = h
        .engine()
        .act(&started.session_id, "key", "window")
        .await
        .unwrap();

    assert_eq!(outcome.story_text, "There is no window here.");
    assert_eq!(h.narrative.calls(), 1);
}

#[tokio::test]
async fn item_is_checked_before_object() {
    let h = Harness::new(ScriptedNarrative::new());
    let started = h.engine().start_session().await.unwrap();

    let outcome = h
        .engine()
        .act(&started.session_id, "sword", "window")
        .await
        .unwrap();

    assert_eq!(outcome.story_text, "You have no sword.");
}

#[tokio::test]
async fn failed_generation_leaves_the_session_untouched() {
    let h = Harness::new(ScriptedNarrative::new());
    let started = h.engine().start_session().await.unwrap();
    let before = h.sessions.load(&started.session_id).await.unwrap().unwrap();

    h.narrative.fail_next(1);
    let err = h
        .engine()
        .act(&started.session_id, "key", "door")
        .await
        .unwrap_err();

    assert!(matches!(err, AdventureError::Llm(_)));
    let after = h.sessions.load(&started.session_id).await.unwrap().unwrap();
    assert_eq!(before, after);
    assert!(after.is_balanced());
}

#[tokio::test]
async fn malformed_reply_is_surfaced_and_not_applied() {
    let h = Harness::new(
        ScriptedNarrative::new().with_reply("use key on door", "the narrator mumbles"),
    );
    let started = h.engine().start_session().await.unwrap();

    let err = h
        .engine()
        .act(&started.session_id, "key", "door")
        .await
        .unwrap_err();

    assert!(matches!(err, AdventureError::MalformedReply { .. }));
    // One regeneration before giving up.
    assert_eq!(h.narrative.calls(), 3);
    let stored = h.sessions.load(&started.session_id).await.unwrap().unwrap();
    assert_eq!(stored.player_turns, vec![OPENING_ACTION]);
}

#[tokio::test]
async fn failed_opening_discards_the_session() {
    let h = Harness::new(ScriptedNarrative::new());

    for _ in 0..3 {
        h.narrative.fail_next(1);
        let err = h.engine().start_session().await.unwrap_err();
        assert!(matches!(err, AdventureError::Llm(_)));
    }
    assert_eq!(h.sessions.count().await.unwrap(), 0);

    let started = h.engine().start_session().await.unwrap();
    assert_eq!(h.sessions.count().await.unwrap(), 1);
    assert!(h.sessions.load(&started.session_id).await.unwrap().is_some());
}

#[tokio::test]
async fn unknown_session_is_reported() {
    let h = Harness::new(ScriptedNarrative::new());

    let err = h.engine().act("missing", "key", "door").await.unwrap_err();
    assert!(matches!(err, AdventureError::SessionNotFound(ref id) if id == "missing"));

    let err = h.engine().snapshot("missing").await.unwrap_err();
    assert!(matches!(err, AdventureError::SessionNotFound(_)));
}

#[tokio::test]
async fn parity_holds_across_a_longer_game() {
    let h = Harness::new(
        ScriptedNarrative::new()
            .with_reply("use key on barrel", reply("Hollow.").no_progress().build())
            .with_reply(
                "use key on door",
                reply("A <object>hall</object> opens up.").new_scene().build(),
            )
            .with_reply(
                "use key on hall",
                reply("Your footsteps echo in the <object>hall</object>.").build(),
            ),
    );
    let id = h.engine().start_session().await.unwrap().session_id;

    for (item, object) in [("key", "barrel"), ("key", "door"), ("key", "hall")] {
        h.engine().act(&id, item, object).await.unwrap();
        let stored = h.sessions.load(&id).await.unwrap().unwrap();
        assert!(stored.is_balanced(), "unbalanced after {item} on {object}");
    }

    let stored = h.sessions.load(&id).await.unwrap().unwrap();
    assert_eq!(
        stored.player_turns,
        vec![OPENING_ACTION, "use key on door", "use key on hall"]
    );
}
