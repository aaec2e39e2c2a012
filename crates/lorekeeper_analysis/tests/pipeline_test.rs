//! End-to-end pipeline tests against a scripted generator.

mod test_utils;

use futures::StreamExt;
use lorekeeper_analysis::{AnalysisEvent, CharacterAnalyzer};
use lorekeeper_core::{
    AnalysisConfig, AnalysisStatus, Appearance, EnumPolicy, Profile, RelationType,
};
use lorekeeper_error::{AnalysisErrorKind, LorekeeperErrorKind, ValidationErrorKind};
use lorekeeper_interface::ProfileStore;
use lorekeeper_storage::InMemoryProfileStore;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use test_utils::{MockGenerator, PromptKind, mei_book};

fn analyzer(
    generator: &Arc<MockGenerator>,
    store: &Arc<InMemoryProfileStore>,
) -> CharacterAnalyzer<Arc<MockGenerator>> {
    analyzer_with(generator, store, AnalysisConfig::default())
}

fn analyzer_with(
    generator: &Arc<MockGenerator>,
    store: &Arc<InMemoryProfileStore>,
    config: AnalysisConfig,
) -> CharacterAnalyzer<Arc<MockGenerator>> {
    CharacterAnalyzer::new(
        Arc::clone(generator),
        Arc::new(mei_book()),
        store.clone(),
        config,
    )
    .expect("valid config")
}

fn set(items: &[usize]) -> BTreeSet<usize> {
    items.iter().copied().collect()
}

fn appearance_indices(profile: &Profile) -> Vec<usize> {
    profile.appearances.iter().map(|a| a.chapter_index).collect()
}

fn names(events: &[AnalysisEvent]) -> Vec<&'static str> {
    events.iter().map(AnalysisEvent::name).collect()
}

#[test]
fn test_search_counts_literal_mentions() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let mentions = analyzer(&generator, &store).search("Mei")?;

    assert_eq!(mentions.chapter_indices, vec![2, 4, 6, 8]);
    assert_eq!(mentions.chapter_titles, vec!["Part 2", "Part 4", "Part 6", "Part 8"]);
    assert_eq!(mentions.mention_counts, vec![1, 2, 1, 1]);
    assert_eq!(mentions.total_mentions, 5);
    assert_eq!(generator.total_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_full_then_continue_covers_all_mentions() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let profile = analyzer.analyze_full("Mei", Some(2)).await?;
    assert_eq!(profile.analysis_status, AnalysisStatus::Completed);
    assert_eq!(profile.analyzed_chapters, set(&[2, 8]));
    assert_eq!(appearance_indices(&profile), vec![2, 8]);
    assert_eq!(profile.first_appearance, Some(2));
    assert_eq!(profile.last_appearance, Some(8));
    assert_eq!(profile.total_chapters_found, 4);
    assert_eq!(profile.description, "Sketch #1");
    assert_eq!(generator.calls(PromptKind::Appearance), 2);
    assert_eq!(generator.calls(PromptKind::Relations), 1);
    assert_eq!(generator.calls(PromptKind::Personality), 1);
    assert_eq!(generator.calls(PromptKind::DeepProfile), 1);

    let continued = analyzer.continue_analysis(profile, Some(2), false).await?;
    assert_eq!(continued.analyzed_chapters, set(&[2, 4, 6, 8]));
    assert_eq!(appearance_indices(&continued), vec![2, 4, 6, 8]);
    assert_eq!(continued.description, "Sketch #1");
    assert_eq!(generator.calls(PromptKind::Appearance), 4);
    assert_eq!(generator.calls(PromptKind::Personality), 1);

    let stored = store.load("Mei").await?.expect("profile saved");
    assert_eq!(stored, continued);
    Ok(())
}

#[tokio::test]
async fn test_not_found_makes_no_model_calls() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());

    let profile = analyzer(&generator, &store)
        .analyze_full("Nonexistent", None)
        .await?;

    assert_eq!(profile.analysis_status, AnalysisStatus::Completed);
    assert!(profile.error_message.is_some());
    assert!(profile.analyzed_chapters.is_empty());
    assert_eq!(profile.total_chapters_found, 0);
    assert_eq!(generator.total_calls(), 0);
    assert!(store.load("Nonexistent").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_failed_chapter_is_excluded_and_requeued() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryProfileStore::new());
    let failing = Arc::new(MockGenerator::new().failing_chapters([4]));

    let profile = analyzer(&failing, &store).analyze_full("Mei", None).await?;
    assert_eq!(profile.analyzed_chapters, set(&[2, 6, 8]));
    assert_eq!(appearance_indices(&profile), vec![2, 6, 8]);
    assert!(profile.sync_report().is_consistent());

    let healthy = Arc::new(MockGenerator::new());
    let continued = analyzer(&healthy, &store)
        .continue_analysis(profile, None, false)
        .await?;
    assert_eq!(healthy.chapters_seen(), vec![4]);
    assert_eq!(continued.analyzed_chapters, set(&[2, 4, 6, 8]));
    assert!(continued.sync_report().is_consistent());
    Ok(())
}

#[tokio::test]
async fn test_chapter_error_event_does_not_stop_the_stream() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new().failing_chapters([6]));
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let events: Vec<_> = analyzer.analyze_stream("Mei", None)?.collect().await;
    let errors: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            AnalysisEvent::ChapterError { chapter_index, .. } => Some(*chapter_index),
            _ => None,
        })
        .collect();
    assert_eq!(errors, vec![6]);

    let Some(AnalysisEvent::Completed(profile)) = events.last() else {
        panic!("stream must end with completed");
    };
    assert_eq!(profile.analyzed_chapters, set(&[2, 4, 8]));
    Ok(())
}

#[tokio::test]
async fn test_continue_without_refresh_keeps_synthesis_fields() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let before = analyzer.analyze_full("Mei", Some(2)).await?;
    let after = analyzer
        .continue_analysis(before.clone(), Some(1), false)
        .await?;

    assert_eq!(after.description, before.description);
    assert_eq!(after.role, before.role);
    assert_eq!(after.personality, before.personality);
    assert_eq!(after.summary, before.summary);
    assert_eq!(after.growth_arc, before.growth_arc);
    assert_eq!(after.relations, before.relations);
    assert_eq!(
        serde_json::to_string(&after.relations)?,
        serde_json::to_string(&before.relations)?
    );
    assert!(after.appearances.len() > before.appearances.len());
    assert!(after.analyzed_chapters.is_superset(&before.analyzed_chapters));
    assert!(after.discovered_characters.is_superset(&before.discovered_characters));
    Ok(())
}

#[tokio::test]
async fn test_continue_with_refresh_reruns_synthesis_on_all_appearances() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let first = analyzer.analyze_full("Mei", Some(2)).await?;
    let refreshed = analyzer.continue_analysis(first, Some(2), true).await?;

    assert_eq!(refreshed.description, "Sketch #2");
    assert_eq!(refreshed.summary, "Summary #2");
    assert_eq!(generator.calls(PromptKind::Relations), 2);
    let lin = refreshed
        .relations
        .iter()
        .find(|relation| relation.target_name == "Lin")
        .expect("relation with Lin");
    assert_eq!(lin.evidence_chapters, vec![2, 4, 6, 8]);
    assert_eq!(lin.first_interaction_chapter, Some(2));
    assert_eq!(lin.relation_type, RelationType::Friend);
    Ok(())
}

#[tokio::test]
async fn test_coverage_grows_monotonically() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let mut profile = analyzer.analyze_full("Mei", Some(1)).await?;
    assert_eq!(profile.analyzed_chapters, set(&[2]));

    for expected in [set(&[2, 4]), set(&[2, 4, 6]), set(&[2, 4, 6, 8])] {
        let previous = profile.analyzed_chapters.clone();
        profile = analyzer.continue_analysis(profile, Some(1), false).await?;
        assert!(profile.analyzed_chapters.is_superset(&previous));
        assert_eq!(profile.analyzed_chapters, expected);
        assert!(profile.sync_report().is_consistent());
    }
    Ok(())
}

#[tokio::test]
async fn test_streaming_event_order() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let events: Vec<_> = analyzer.analyze_stream("Mei", Some(4))?.collect().await;
    assert_eq!(
        names(&events),
        vec![
            "search_complete",
            "chapter_analyzed",
            "chapter_analyzed",
            "chapter_analyzed",
            "chapter_analyzed",
            "relations_analyzed",
            "personality_analyzed",
            "deep_profile_analyzed",
            "completed",
        ]
    );
    let analyzed: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            AnalysisEvent::ChapterAnalyzed {
                chapter_index,
                chapters_to_analyze,
                ..
            } => Some((*chapter_index, *chapters_to_analyze)),
            _ => None,
        })
        .collect();
    assert_eq!(analyzed, vec![(2, 4), (4, 4), (6, 4), (8, 4)]);
    assert_eq!(generator.chapters_seen(), vec![2, 4, 6, 8]);
    Ok(())
}

#[tokio::test]
async fn test_continue_stream_skips_summary() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let profile = analyzer.analyze_full("Mei", Some(2)).await?;
    let events: Vec<_> = analyzer
        .continue_stream(profile, Some(5), false)?
        .collect()
        .await;

    assert_eq!(
        names(&events),
        vec![
            "search_complete",
            "continue_info",
            "chapter_analyzed",
            "chapter_analyzed",
            "summary_skipped",
            "completed",
        ]
    );
    assert_eq!(
        events[1],
        AnalysisEvent::ContinueInfo {
            already_analyzed: 2,
            remaining: 2,
            will_analyze: vec![4, 6],
            refresh_summary: false,
            dropped: vec![],
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_continue_with_nothing_remaining_returns_profile_unchanged() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let complete = analyzer.analyze_full("Mei", None).await?;
    let calls = generator.total_calls();

    let events: Vec<_> = analyzer
        .continue_stream(complete.clone(), None, true)?
        .collect()
        .await;
    assert_eq!(
        names(&events),
        vec!["search_complete", "continue_info", "info", "completed"]
    );
    let Some(AnalysisEvent::Completed(unchanged)) = events.last() else {
        panic!("stream must end with completed");
    };
    assert_eq!(**unchanged, complete);
    assert_eq!(generator.total_calls(), calls);
    Ok(())
}

#[tokio::test]
async fn test_continue_repairs_desynchronized_input() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let mut broken = Profile::new("Mei");
    broken.appearances.push(Appearance::new(2, "Part 2"));
    broken.analyzed_chapters = set(&[2, 4]);

    let repaired = analyzer.continue_analysis(broken, Some(1), false).await?;
    assert_eq!(generator.chapters_seen(), vec![4]);
    assert_eq!(repaired.analyzed_chapters, set(&[2, 4]));
    assert!(repaired.sync_report().is_consistent());
    Ok(())
}

#[tokio::test]
async fn test_refresh_reruns_only_synthesis() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let profile = analyzer.analyze_full("Mei", Some(2)).await?;
    let events: Vec<_> = analyzer.refresh_stream(profile.clone())?.collect().await;

    assert_eq!(
        names(&events),
        vec![
            "search_complete",
            "relations_analyzed",
            "personality_analyzed",
            "deep_profile_analyzed",
            "completed",
        ]
    );
    assert_eq!(generator.calls(PromptKind::Appearance), 2);
    let Some(AnalysisEvent::Completed(refreshed)) = events.last() else {
        panic!("stream must end with completed");
    };
    assert_eq!(refreshed.description, "Sketch #2");
    assert_eq!(refreshed.appearances, profile.appearances);
    Ok(())
}

#[tokio::test]
async fn test_stage_failure_is_terminal_and_not_saved() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new().failing_stage(PromptKind::Personality));
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let err = analyzer
        .analyze_full("Mei", Some(2))
        .await
        .expect_err("personality stage fails");
    match err.kind() {
        LorekeeperErrorKind::Analysis(e) => match &e.kind {
            AnalysisErrorKind::StageFailed { stage, .. } => assert_eq!(stage, "personality"),
            other => panic!("unexpected analysis error: {other}"),
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(generator.calls(PromptKind::DeepProfile), 0);
    assert!(store.load("Mei").await?.is_none());

    let events: Vec<_> = analyzer.analyze_stream("Mei", Some(2))?.collect().await;
    assert_eq!(events.last().map(AnalysisEvent::name), Some("error"));
    Ok(())
}

#[tokio::test]
async fn test_notable_quotes_and_discovered_characters() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());

    let profile = analyzer(&generator, &store)
        .analyze_full("Mei", Some(2))
        .await?;

    assert_eq!(profile.notable_quotes, vec!["Line from chapter 3"]);
    let discovered: Vec<_> = profile.discovered_characters.iter().cloned().collect();
    assert_eq!(discovered, vec!["Lin", "Wu", "Zhou"]);
    Ok(())
}

#[tokio::test]
async fn test_reject_policy_drops_unknown_relation_types() -> anyhow::Result<()> {
    let reply = json!({"relations": [
        {"target_name": "Lin", "relation_type": "frenemy"},
        {"target_name": "Zhou", "relation_type": "rival"}
    ]});
    let store = Arc::new(InMemoryProfileStore::new());

    let rejecting = Arc::new(MockGenerator::new().relations_reply(reply.clone()));
    let config = AnalysisConfig::default().with_enum_policy(EnumPolicy::Reject);
    let profile = analyzer_with(&rejecting, &store, config)
        .analyze_full("Mei", Some(2))
        .await?;
    let targets: Vec<_> = profile.relations.iter().map(|r| r.target_name.as_str()).collect();
    assert_eq!(targets, vec!["Zhou"]);

    let passing = Arc::new(MockGenerator::new().relations_reply(reply));
    let config = AnalysisConfig::default().with_enum_policy(EnumPolicy::Passthrough);
    let profile = analyzer_with(&passing, &store, config)
        .analyze_full("Mei", Some(2))
        .await?;
    assert_eq!(
        profile.relations[0].relation_type,
        RelationType::Other("frenemy".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_caller_misuse_is_rejected_before_any_call() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    for name in ["", "   ", "../etc", "a/b"] {
        let err = analyzer.analyze_full(name, None).await.expect_err(name);
        assert!(matches!(err.kind(), LorekeeperErrorKind::Validation(_)));
    }
    assert!(analyzer.analyze_full("Mei", Some(0)).await.is_err());
    assert!(
        analyzer
            .continue_analysis(Profile::new("Mei"), Some(0), false)
            .await
            .is_err()
    );
    assert_eq!(generator.total_calls(), 0);

    let err = analyzer.load_profile("Mei").await.expect_err("nothing stored");
    assert!(matches!(
        err.kind(),
        LorekeeperErrorKind::Analysis(e) if matches!(e.kind, AnalysisErrorKind::ProfileNotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_recorded_chapter_outside_book_is_rejected() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let mut foreign = Profile::new("Mei");
    foreign.appearances.push(Appearance::new(3, "Part 3"));
    foreign.appearances.push(Appearance::new(50, "Part 50"));
    foreign.analyzed_chapters = set(&[3, 50]);

    let err = analyzer
        .continue_analysis(foreign.clone(), Some(4), false)
        .await
        .expect_err("chapter 50 is outside a ten-chapter book");
    assert!(matches!(
        err.kind(),
        LorekeeperErrorKind::Validation(e)
            if matches!(e.kind, ValidationErrorKind::ChapterOutOfRange { index: 50, chapter_count: 10 })
    ));
    assert!(analyzer.continue_stream(foreign.clone(), Some(4), false).is_err());
    assert!(analyzer.refresh(foreign).await.is_err());

    assert_eq!(generator.total_calls(), 0);
    assert!(store.load("Mei").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_continue_drops_chapters_without_mentions() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let mut stale = Profile::new("Mei");
    stale.appearances.push(Appearance::new(2, "Part 2"));
    stale.appearances.push(Appearance::new(3, "Part 3"));
    stale.analyzed_chapters = set(&[2, 3]);

    let events: Vec<_> = analyzer
        .continue_stream(stale, Some(4), false)?
        .collect()
        .await;
    assert_eq!(
        events[1],
        AnalysisEvent::ContinueInfo {
            already_analyzed: 1,
            remaining: 3,
            will_analyze: vec![4, 6, 8],
            refresh_summary: false,
            dropped: vec![3],
        }
    );
    let Some(AnalysisEvent::Completed(profile)) = events.last() else {
        panic!("stream must end with completed");
    };
    assert_eq!(generator.chapters_seen(), vec![4, 6, 8]);
    assert_eq!(profile.analyzed_chapters, set(&[2, 4, 6, 8]));
    assert_eq!(appearance_indices(profile), vec![2, 4, 6, 8]);
    assert_eq!(store.load("Mei").await?.as_ref(), Some(&**profile));
    Ok(())
}

#[tokio::test]
async fn test_stale_chapters_are_dropped_even_with_nothing_to_extract() -> anyhow::Result<()> {
    let generator = Arc::new(MockGenerator::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let analyzer = analyzer(&generator, &store);

    let complete = analyzer.analyze_full("Mei", None).await?;
    let mut stale = complete.clone();
    stale.appearances.push(Appearance::new(5, "Part 5"));
    stale.analyzed_chapters.insert(5);

    let profile = analyzer.continue_analysis(stale, None, false).await?;
    assert_eq!(profile.analyzed_chapters, complete.analyzed_chapters);
    assert_eq!(appearance_indices(&profile), vec![2, 4, 6, 8]);
    assert_eq!(store.load("Mei").await?, Some(profile));
    Ok(())
}
