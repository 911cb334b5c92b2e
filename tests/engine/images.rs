use super::support::{CountingImages, Harness, ScriptedNarrative, png_for};
use infinite_adventure::AdventureError;
use infinite_adventure::cache::Fingerprint;
use infinite_adventure::llm::RetryPolicy;
use std::time::Duration;

async fn started(h: &Harness) -> (String, Fingerprint) {
    let started = h.engine().start_session().await.unwrap();
    let fp = Fingerprint::image("a dim cellar with a locked door");
    let url = started.outcome.image_url.unwrap();
    assert!(url.contains(fp.as_str()));
    (started.session_id, fp)
}

#[tokio::test]
async fn turns_schedule_images_without_drawing_them() {
    let h = Harness::new(ScriptedNarrative::new());
    started(&h).await;
    assert_eq!(h.images.calls(), 0);
}

#[tokio::test]
async fn image_is_generated_once_and_reused() {
    let h = Harness::new(ScriptedNarrative::new());
    let (session_id, fp) = started(&h).await;

    let first = h.materializer().resolve(Some(&session_id), &fp).await.unwrap();
    let second = h.materializer().resolve(Some(&session_id), &fp).await.unwrap();

    assert_eq!(first, png_for("a dim cellar with a locked door"));
    assert_eq!(first, second);
    assert_eq!(h.images.calls(), 1);
}

#[tokio::test]
async fn stored_image_is_served_without_a_session() {
    let h = Harness::new(ScriptedNarrative::new());
    let (session_id, fp) = started(&h).await;
    h.materializer().resolve(Some(&session_id), &fp).await.unwrap();

    let bytes = h.materializer().resolve(None, &fp).await.unwrap();
    assert_eq!(bytes, png_for("a dim cellar with a locked door"));
    assert_eq!(h.images.calls(), 1);
}

#[tokio::test]
async fn concurrent_requests_share_one_generation() {
    let h = Harness::with_policy(
        ScriptedNarrative::new(),
        CountingImages::new().with_delay(Duration::from_millis(50)),
        RetryPolicy::new(5, 0),
    );
    let (session_id, fp) = started(&h).await;

    let (a, b, c) = tokio::join!(
        h.materializer().resolve(Some(&session_id), &fp),
        h.materializer().resolve(Some(&session_id), &fp),
        h.materializer().resolve(Some(&session_id), &fp),
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert!(c.is_ok());
    assert_eq!(h.images.calls(), 1);
}

#[tokio::test]
async fn unknown_fingerprint_is_rejected() {
    let h = Harness::new(ScriptedNarrative::new());
    let (session_id, _) = started(&h).await;

    let err = h
        .materializer()
        .resolve(Some(&session_id), &Fingerprint::image("never scheduled"))
        .await
        .unwrap_err();

    assert!(matches!(err, AdventureError::UnknownImageReference { .. }));
    assert_eq!(h.images.calls(), 0);
}

#[tokio::test]
async fn pending_image_needs_its_session() {
    let h = Harness::new(ScriptedNarrative::new());
    let (_, fp) = started(&h).await;

    let no_session = h.materializer().resolve(None, &fp).await.unwrap_err();
    let wrong_session = h
        .materializer()
        .resolve(Some("someone-else"), &fp)
        .await
        .unwrap_err();

    assert!(matches!(no_session, AdventureError::UnknownImageReference { .. }));
    assert!(matches!(wrong_session, AdventureError::UnknownImageReference { .. }));
    assert_eq!(h.images.calls(), 0);
}

#[tokio::test]
async fn slow_image_times_out_and_stores_nothing() {
    let h = Harness::with_policy(
        ScriptedNarrative::new(),
        CountingImages::new().with_delay(Duration::from_secs(5)),
        RetryPolicy::new(5, 0).with_timeout(Duration::from_millis(30)),
    );
    let (session_id, fp) = started(&h).await;

    let err = h
        .materializer()
        .resolve(Some(&session_id), &fp)
        .await
        .unwrap_err();

    assert!(matches!(err, AdventureError::GenerationTimeout { what: "image", .. }));
    assert!(err.is_retryable());
    assert!(h.materializer().cache().get(&fp).await.unwrap().is_none());
}
