//! Integration tests for the translation version lifecycle: numbering,
//! the single-active invariant, deletion with promotion, and per-chapter
//! write serialization.

use palimpsest::{
    ChapterInput, ChapterRef, Library, SettingsSnapshot, StoreError, TranslationResult,
};

const CH1_URL: &str = "https://novels.example/nov-1/ch-1";
const CH2_URL: &str = "https://novels.example/nov-1/ch-2";

fn library_with_chapters() -> Library {
    let library = Library::open_in_memory().unwrap();
    library
        .store_chapter(
            ChapterInput::new(CH1_URL, "Chapter 1", "First chapter body.")
                .with_stable_id("nov-1-ch-1")
                .with_chapter_number(1),
        )
        .unwrap();
    library
        .store_chapter(
            ChapterInput::new(CH2_URL, "Chapter 2", "Second chapter body.")
                .with_stable_id("nov-1-ch-2")
                .with_chapter_number(2),
        )
        .unwrap();
    library
}

async fn translate(library: &Library, reference: &ChapterRef, text: &str) -> u32 {
    library
        .store_translation(
            reference,
            TranslationResult::new("Chapter 1", text),
            SettingsSnapshot::new("openai", "gpt-4o"),
        )
        .await
        .unwrap()
        .version
}

#[tokio::test]
async fn first_version_is_one_and_active() {
    let library = library_with_chapters();
    let by_url = ChapterRef::by_url(CH1_URL);

    assert!(library.active_translation(&by_url).await.unwrap().is_none());

    let v = library
        .store_translation(
            &by_url,
            TranslationResult::new("Chapter 1", "translated"),
            SettingsSnapshot::new("openai", "gpt-4o"),
        )
        .await
        .unwrap();
    assert_eq!(v.version, 1);
    assert!(v.is_active);

    let active = library.active_translation(&by_url).await.unwrap().unwrap();
    assert_eq!(active.id, v.id);
}

#[tokio::test]
async fn versions_interleave_across_url_and_stable_id() {
    let library = library_with_chapters();
    let by_url = ChapterRef::by_url(CH1_URL);
    let by_id = ChapterRef::by_stable_id("nov-1-ch-1");

    assert_eq!(translate(&library, &by_url, "draft one").await, 1);
    assert_eq!(translate(&library, &by_id, "draft two").await, 2);

    // Both references see the same chapter's history, newest first.
    let versions = library.translation_versions(&by_id).await.unwrap();
    let numbers: Vec<u32> = versions.iter().map(|v| v.version).collect();
    assert_eq!(numbers, vec![2, 1]);
    assert!(versions[0].is_active);
    assert!(!versions[1].is_active);
}

#[tokio::test]
async fn exactly_one_active_after_every_transition() {
    let library = library_with_chapters();
    let by_url = ChapterRef::by_url(CH1_URL);

    for text in ["a", "b", "c"] {
        translate(&library, &by_url, text).await;
        let versions = library.translation_versions(&by_url).await.unwrap();
        assert_eq!(versions.iter().filter(|v| v.is_active).count(), 1);
    }

    library.set_active_version(&by_url, 1).await.unwrap();
    let versions = library.translation_versions(&by_url).await.unwrap();
    assert_eq!(versions.iter().filter(|v| v.is_active).count(), 1);
    assert_eq!(
        versions.iter().find(|v| v.is_active).unwrap().version,
        1
    );
}

#[tokio::test]
async fn set_active_rejects_unknown_version() {
    let library = library_with_chapters();
    let by_url = ChapterRef::by_url(CH1_URL);
    translate(&library, &by_url, "only").await;

    let err = library.set_active_version(&by_url, 99).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::VersionNotFound { version: 99, .. }
    ));
}

#[tokio::test]
async fn deleting_active_promotes_highest_remaining() {
    let library = library_with_chapters();
    let by_url = ChapterRef::by_url(CH1_URL);
    for text in ["a", "b", "c"] {
        translate(&library, &by_url, text).await;
    }

    // v3 is active; delete it and v2 must take over (not v1).
    library.delete_version_number(&by_url, 3).await.unwrap();
    let active = library.active_translation(&by_url).await.unwrap().unwrap();
    assert_eq!(active.version, 2);

    // Deleting an inactive version changes nothing about the active one.
    library.delete_version_number(&by_url, 1).await.unwrap();
    let active = library.active_translation(&by_url).await.unwrap().unwrap();
    assert_eq!(active.version, 2);
}

#[tokio::test]
async fn deleting_the_last_version_is_a_valid_terminal_state() {
    let library = library_with_chapters();
    let by_url = ChapterRef::by_url(CH1_URL);
    let v = library
        .store_translation(
            &by_url,
            TranslationResult::new("Chapter 1", "only"),
            SettingsSnapshot::new("openai", "gpt-4o"),
        )
        .await
        .unwrap();

    assert!(library.delete_version(&v.id).await.unwrap());
    assert!(library.active_translation(&by_url).await.unwrap().is_none());
    assert!(library
        .translation_versions(&by_url)
        .await
        .unwrap()
        .is_empty());

    // Unknown ids report false rather than erroring.
    assert!(!library.delete_version(&v.id).await.unwrap());
}

#[tokio::test]
async fn deleting_an_absent_version_number_errors() {
    let library = library_with_chapters();
    let by_url = ChapterRef::by_url(CH1_URL);
    translate(&library, &by_url, "only").await;

    let err = library.delete_version_number(&by_url, 7).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::VersionNotFound { version: 7, .. }
    ));

    // The existing version is untouched.
    let versions = library.translation_versions(&by_url).await.unwrap();
    assert_eq!(versions.len(), 1);
}

#[tokio::test]
async fn version_numbers_are_never_reused_after_deletion() {
    let library = library_with_chapters();
    let by_url = ChapterRef::by_url(CH1_URL);
    for text in ["a", "b", "c"] {
        translate(&library, &by_url, text).await;
    }

    // Remove the newest record; the next store must not hand out 3 again.
    library.delete_version_number(&by_url, 3).await.unwrap();
    assert_eq!(translate(&library, &by_url, "d").await, 4);

    // Even after wiping the whole history the counter keeps climbing.
    for v in [1, 2, 4] {
        library.delete_version_number(&by_url, v).await.unwrap();
    }
    assert_eq!(translate(&library, &by_url, "e").await, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_stores_on_one_chapter_get_distinct_numbers() {
    let library = library_with_chapters();

    let mut handles = Vec::new();
    for i in 0..3 {
        let library = library.clone();
        handles.push(tokio::spawn(async move {
            translate(&library, &ChapterRef::by_url(CH1_URL), &format!("draft {i}")).await
        }));
    }

    let mut numbers: Vec<u32> = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap());
    }
    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2, 3]);

    let versions = library
        .translation_versions(&ChapterRef::by_url(CH1_URL))
        .await
        .unwrap();
    assert_eq!(versions.len(), 3);
    assert_eq!(versions.iter().filter(|v| v.is_active).count(), 1);
}

#[tokio::test]
async fn chapters_number_independently() {
    let library = library_with_chapters();
    translate(&library, &ChapterRef::by_url(CH1_URL), "one").await;
    translate(&library, &ChapterRef::by_url(CH1_URL), "two").await;

    // The second chapter starts its own sequence at 1.
    assert_eq!(translate(&library, &ChapterRef::by_url(CH2_URL), "eins").await, 1);
}

#[tokio::test]
async fn storing_against_an_unknown_url_requires_the_chapter() {
    let library = library_with_chapters();
    let err = library
        .store_translation(
            &ChapterRef::by_url("https://novels.example/ghost"),
            TranslationResult::new("t", "c"),
            SettingsSnapshot::new("openai", "gpt-4o"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ChapterRequired { .. }));
}

#[tokio::test]
async fn an_empty_reference_is_rejected() {
    let library = library_with_chapters();
    let empty = ChapterRef {
        url: None,
        stable_id: None,
    };
    let err = library.active_translation(&empty).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidReference));
}

#[tokio::test]
async fn versions_carry_the_denormalized_stable_id() {
    let library = library_with_chapters();
    translate(&library, &ChapterRef::by_url(CH1_URL), "one").await;

    let versions = library.versions_for_stable_id("nov-1-ch-1").unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].chapter_url, CH1_URL);
}
