use super::*;
use crate::source::MockItemSource;
use std::time::Duration;

const ORIGIN: &str = "test-instance";

fn story(id: ItemId, score: u32) -> RawItem {
    RawItem {
        id,
        title: format!("Story {id}"),
        uri: Some(format!("https://example.com/{id}")),
        posted_by: "author".to_string(),
        time: 1_700_000_000,
        score,
        comment_count: 1,
    }
}

fn build(
    source: MockItemSource,
    concurrency: usize,
) -> (BestStoriesAggregator<MockItemSource>, Arc<MockItemSource>) {
    build_with_ttl(source, concurrency, Duration::from_secs(600))
}

fn build_with_ttl(
    source: MockItemSource,
    concurrency: usize,
    ttl: Duration,
) -> (BestStoriesAggregator<MockItemSource>, Arc<MockItemSource>) {
    let source = Arc::new(source);
    let aggregator = BestStoriesAggregator::new(
        Arc::clone(&source),
        StoryCache::new(),
        FetchLimiter::new(concurrency),
        AggregatorConfig::new(ttl, ORIGIN),
    );
    (aggregator, source)
}

fn scores(stories: &[EnrichedItem]) -> Vec<u32> {
    stories.iter().map(|s| s.score).collect()
}

fn ids(stories: &[EnrichedItem]) -> Vec<ItemId> {
    stories.iter().map(|s| s.id).collect()
}

#[test]
fn test_aggregator_config_defaults() {
    let config = AggregatorConfig::default();
    assert_eq!(config.cache_ttl, Duration::from_secs(600));
    assert_eq!(config.origin, DEFAULT_ORIGIN);

    let config = config.cache_ttl(Duration::from_secs(1)).origin("node-a");
    assert_eq!(config.cache_ttl, Duration::from_secs(1));
    assert_eq!(config.origin, "node-a");
}

#[test]
fn test_fetch_limiter_capacity_is_at_least_one() {
    assert_eq!(FetchLimiter::new(0).capacity(), 1);
    assert_eq!(FetchLimiter::new(4).available(), 4);
    assert_eq!(FetchLimiter::default().capacity(), DEFAULT_FETCH_CONCURRENCY);
}

#[tokio::test]
async fn test_fetch_limiter_clones_share_permits() {
    let limiter = FetchLimiter::new(2);
    let other = limiter.clone();
    let cancel = CancellationToken::new();

    let _permit = limiter.acquire(&cancel).await.unwrap();
    assert_eq!(other.available(), 1);
}

#[tokio::test]
async fn test_fetch_limiter_acquire_observes_cancellation() {
    let limiter = FetchLimiter::new(1);
    let cancel = CancellationToken::new();
    let _held = limiter.acquire(&cancel).await.unwrap();

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(1), limiter.acquire(&cancel))
        .await
        .expect("acquire should abort once cancelled");
    assert_eq!(result.unwrap_err(), SourceError::Cancelled);
}

#[test]
fn test_rank_orders_by_score_then_id() {
    let items = vec![story(5, 10), story(2, 10), story(1, 30), story(9, 10)];
    let ranked: Vec<ItemId> = rank(&items, 10).iter().map(|s| s.id).collect();
    assert_eq!(ranked, vec![1, 2, 5, 9]);

    assert_eq!(rank(&items, 2).len(), 2);
    assert!(rank(&items, 0).is_empty());
}

#[tokio::test]
async fn test_cache_reused_across_counts() {
    let (aggregator, source) =
        build(MockItemSource::new().with_stories(vec![story(1, 100), story(2, 200)]), 10);
    let cancel = CancellationToken::new();

    let first = aggregator.top_n_with_status(1, &cancel).await.unwrap();
    assert_eq!(first.cache_status, CacheStatus::Miss);
    assert_eq!(scores(&first.stories), vec![200]);

    let second = aggregator.top_n_with_status(2, &cancel).await.unwrap();
    assert_eq!(second.cache_status, CacheStatus::Hit);
    assert_eq!(scores(&second.stories), vec![200, 100]);

    assert_eq!(source.list_calls(), 1);
    assert_eq!(source.detail_calls_for(1), 1);
    assert_eq!(source.detail_calls_for(2), 1);
}

#[tokio::test]
async fn test_results_sorted_by_score_descending() {
    let stories: Vec<RawItem> = (1..=20).map(|id| story(id, ((id * 37) % 11) as u32)).collect();
    let (aggregator, _) = build(MockItemSource::new().with_stories(stories), 4);

    let top = aggregator
        .top_n(20, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(top.len(), 20);
    assert!(top.windows(2).all(|pair| pair[0].score >= pair[1].score));
}

#[tokio::test]
async fn test_count_zero_and_oversized_count() {
    let (aggregator, source) = build(
        MockItemSource::new().with_stories(vec![story(1, 1), story(2, 2), story(3, 3)]),
        10,
    );
    let cancel = CancellationToken::new();

    assert!(aggregator.top_n(0, &cancel).await.unwrap().is_empty());
    assert_eq!(aggregator.top_n(100, &cancel).await.unwrap().len(), 3);
    assert_eq!(source.list_calls(), 1);
}

#[tokio::test]
async fn test_empty_id_list_skips_details_and_cache() {
    let (aggregator, source) = build(MockItemSource::new().with_ids(Vec::new()), 10);
    let cancel = CancellationToken::new();

    let top = aggregator.top_n_with_status(5, &cancel).await.unwrap();
    assert!(top.stories.is_empty());
    assert_eq!(top.cache_status, CacheStatus::Miss);
    assert_eq!(source.detail_calls(), 0);
    assert!(aggregator.cache().get(&BEST_STORIES_CACHE_KEY).is_none());

    aggregator.top_n(5, &cancel).await.unwrap();
    assert_eq!(source.list_calls(), 2);
}

#[tokio::test]
async fn test_list_failure_propagates_unchanged() {
    let failure = SourceError::transport("http://upstream/v0/beststories.json", "status 500");
    let (aggregator, source) = build(
        MockItemSource::new()
            .with_stories(vec![story(1, 1)])
            .with_list_failure(failure.clone()),
        10,
    );

    let err = aggregator
        .top_n(5, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, failure);
    assert_eq!(source.detail_calls(), 0);
}

#[tokio::test]
async fn test_detail_failure_fails_batch_without_caching() {
    let failure = SourceError::transport("http://upstream/v0/item/3.json", "reset");
    let stories: Vec<RawItem> = (1..=5).map(|id| story(id, id as u32)).collect();
    let (aggregator, source) = build(
        MockItemSource::new()
            .with_stories(stories)
            .with_detail_failure(3, failure.clone()),
        2,
    );
    let cancel = CancellationToken::new();

    let err = aggregator.top_n(5, &cancel).await.unwrap_err();
    assert_eq!(err, failure);
    assert!(aggregator.cache().get(&BEST_STORIES_CACHE_KEY).is_none());
    assert_eq!(aggregator.limiter().available(), 2);
    assert_eq!(source.in_flight(), 0);

    source.clear_failures();
    let top = aggregator.top_n(5, &cancel).await.unwrap();
    assert_eq!(scores(&top), vec![5, 4, 3, 2, 1]);
    assert_eq!(source.list_calls(), 2);
}

#[tokio::test]
async fn test_missing_detail_reports_not_found() {
    let (aggregator, _) = build(
        MockItemSource::new()
            .with_stories(vec![story(1, 1)])
            .with_ids(vec![1, 2]),
        10,
    );

    let err = aggregator
        .top_n(2, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, SourceError::NotFound { id: 2 });
}

#[tokio::test]
async fn test_detail_fetches_bounded_by_limiter() {
    let stories: Vec<RawItem> = (1..=50).map(|id| story(id, id as u32)).collect();
    let (aggregator, source) = build(
        MockItemSource::new()
            .with_stories(stories)
            .with_delay(Duration::from_millis(5)),
        3,
    );

    let top = aggregator
        .top_n(50, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(top.len(), 50);
    assert_eq!(source.detail_calls(), 50);
    assert_eq!(source.peak_in_flight(), 3);
    assert_eq!(aggregator.limiter().available(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_limiter_bounds_overlapping_calls() {
    let stories: Vec<RawItem> = (1..=30).map(|id| story(id, id as u32)).collect();
    let source = Arc::new(
        MockItemSource::new()
            .with_stories(stories)
            .with_delay(Duration::from_millis(5)),
    );
    let limiter = FetchLimiter::new(3);
    let make = || {
        BestStoriesAggregator::new(
            Arc::clone(&source),
            StoryCache::new(),
            limiter.clone(),
            AggregatorConfig::new(Duration::from_secs(600), ORIGIN),
        )
    };
    let (first, second) = (make(), make());
    let cancel = CancellationToken::new();

    let (a, b) = tokio::join!(first.top_n(30, &cancel), second.top_n(30, &cancel));
    assert_eq!(a.unwrap().len(), 30);
    assert_eq!(b.unwrap().len(), 30);

    assert_eq!(source.list_calls(), 2);
    assert_eq!(source.detail_calls(), 60);
    assert!(source.peak_in_flight() <= 3);
    assert_eq!(limiter.available(), 3);
}

#[tokio::test]
async fn test_expired_entry_triggers_refetch() {
    let (aggregator, source) = build_with_ttl(
        MockItemSource::new().with_stories(vec![story(1, 10)]),
        10,
        Duration::from_millis(50),
    );
    let cancel = CancellationToken::new();

    aggregator.top_n(1, &cancel).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let top = aggregator.top_n_with_status(1, &cancel).await.unwrap();
    assert_eq!(top.cache_status, CacheStatus::Miss);
    assert_eq!(source.list_calls(), 2);
    assert_eq!(source.detail_calls_for(1), 2);
}

#[tokio::test]
async fn test_refetch_picks_up_new_stories_after_expiry() {
    let (aggregator, source) = build_with_ttl(
        MockItemSource::new().with_stories(vec![story(1, 10)]),
        10,
        Duration::from_millis(200),
    );
    let cancel = CancellationToken::new();

    assert_eq!(ids(&aggregator.top_n(5, &cancel).await.unwrap()), vec![1]);
    source.set_stories(vec![story(1, 10), story(2, 20)]);
    assert_eq!(ids(&aggregator.top_n(5, &cancel).await.unwrap()), vec![1]);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(ids(&aggregator.top_n(5, &cancel).await.unwrap()), vec![2, 1]);
}

#[tokio::test]
async fn test_enrichment_reflects_access_time() {
    let (aggregator, _) = build(MockItemSource::new().with_stories(vec![story(1, 10)]), 10);
    let cancel = CancellationToken::new();

    let first = aggregator.top_n(1, &cancel).await.unwrap().remove(0);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = aggregator.top_n(1, &cancel).await.unwrap().remove(0);

    assert!(second.created_at > first.created_at);
    assert_eq!(first.created_on, ORIGIN);
    assert_eq!(second.created_on, ORIGIN);
    assert_eq!(
        (first.id, &first.title, first.score, first.time),
        (second.id, &second.title, second.score, second.time)
    );
}

#[tokio::test]
async fn test_equal_scores_ordered_by_id_regardless_of_completion() {
    let (aggregator, _) = build(
        MockItemSource::new()
            .with_stories(vec![story(5, 10), story(2, 10), story(1, 20), story(9, 10)])
            .with_item_delay(2, Duration::from_millis(30))
            .with_item_delay(5, Duration::from_millis(10)),
        10,
    );

    let top = aggregator
        .top_n(4, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(ids(&top), vec![1, 2, 5, 9]);
}

#[tokio::test]
async fn test_cancelled_token_short_circuits() {
    let (aggregator, source) = build(MockItemSource::new().with_stories(vec![story(1, 1)]), 10);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = aggregator.top_n(1, &cancel).await.unwrap_err();
    assert_eq!(err, SourceError::Cancelled);
    assert_eq!(source.list_calls(), 0);
}

#[tokio::test]
async fn test_cancellation_aborts_pending_permit_wait() {
    let (aggregator, source) = build(
        MockItemSource::new().with_stories(vec![story(1, 1), story(2, 2)]),
        1,
    );
    let limiter = aggregator.limiter().clone();
    let idle = CancellationToken::new();
    let held = limiter.acquire(&idle).await.unwrap();

    let cancel = CancellationToken::new();
    let canceller = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    };

    let (result, ()) = tokio::time::timeout(Duration::from_secs(1), async {
        tokio::join!(aggregator.top_n(2, &cancel), canceller)
    })
    .await
    .expect("pending acquire should abort promptly");

    assert_eq!(result.unwrap_err(), SourceError::Cancelled);
    assert_eq!(source.detail_calls(), 0);
    assert!(aggregator.cache().get(&BEST_STORIES_CACHE_KEY).is_none());

    drop(held);
    assert_eq!(limiter.available(), 1);
}

#[tokio::test]
async fn test_cancellation_is_prompt_even_if_source_ignores_it() {
    let (aggregator, source) = build(
        MockItemSource::new()
            .with_stories(vec![story(1, 1), story(2, 2), story(3, 3)])
            .with_item_delay(1, Duration::from_secs(30))
            .with_item_delay(2, Duration::from_secs(30))
            .with_item_delay(3, Duration::from_secs(30))
            .ignoring_cancellation(),
        2,
    );

    let cancel = CancellationToken::new();
    let canceller = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    };

    let (result, ()) = tokio::time::timeout(Duration::from_secs(1), async {
        tokio::join!(aggregator.top_n(3, &cancel), canceller)
    })
    .await
    .expect("cancellation should not wait for the source");

    assert_eq!(result.unwrap_err(), SourceError::Cancelled);
    assert_eq!(source.in_flight(), 0);
    assert_eq!(aggregator.limiter().available(), 2);
    assert!(aggregator.cache().get(&BEST_STORIES_CACHE_KEY).is_none());
}

#[tokio::test]
async fn test_concurrent_callers_share_cached_set() {
    let (aggregator, source) = build(
        MockItemSource::new().with_stories(vec![story(1, 1), story(2, 2)]),
        10,
    );
    let cancel = CancellationToken::new();
    aggregator.top_n(2, &cancel).await.unwrap();

    let (a, b, c) = tokio::join!(
        aggregator.top_n(1, &cancel),
        aggregator.top_n(2, &cancel),
        aggregator.top_n(5, &cancel)
    );
    assert_eq!(a.unwrap().len(), 1);
    assert_eq!(b.unwrap().len(), 2);
    assert_eq!(c.unwrap().len(), 2);
    assert_eq!(source.list_calls(), 1);
}
