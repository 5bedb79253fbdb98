//! Finalizer: final deduplication, ordering and statistics.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::dedup::Deduplicator;
use crate::models::{PostRecord, RunStats};
use crate::timestamps::resolve_timestamp;

/// Deduplicate, resolve timestamps, order and number the accumulated posts,
/// and compute statistics over the result.
///
/// Ordering: newest first when both posts have a resolved timestamp,
/// otherwise the post first seen on an earlier scroll pass comes first.
/// Posts equal under that rule keep their admission order. Timestamped
/// posts always end up newest first among themselves, even when untimed
/// posts sit between them.
pub fn finalize(records: Vec<PostRecord>, now: DateTime<Utc>) -> (Vec<PostRecord>, RunStats) {
    let before = records.len();

    let mut records = records;
    records.sort_by_key(|r| r.sequence_index);

    let mut dedup = Deduplicator::new();
    let mut posts: Vec<PostRecord> = records
        .into_iter()
        .filter(|r| dedup.admit(r))
        .map(|mut r| {
            r.timestamp_resolved = resolve_timestamp(&r.timestamp_raw, now);
            r
        })
        .collect();

    if posts.len() != before {
        debug!(
            "Final pass dropped {} duplicate posts",
            before - posts.len()
        );
    }

    stable_merge_sort(&mut posts, feed_order);
    let mut posts = order_timed_slots(posts);

    for (i, post) in posts.iter_mut().enumerate() {
        post.final_order = Some(i as u64 + 1);
    }

    let stats = compute_stats(&posts);
    (posts, stats)
}

/// Mixed comparator: resolved time descending when both sides have one,
/// else capture pass ascending.
pub fn feed_order(a: &PostRecord, b: &PostRecord) -> Ordering {
    match (a.timestamp_resolved, b.timestamp_resolved) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        _ => a.capture_scroll_index.cmp(&b.capture_scroll_index),
    }
}

/// Re-sort the timestamped posts among the slots they already occupy,
/// newest first. Untimed posts stay where the merge put them.
///
/// `feed_order` is not transitive across a mix of timed and untimed posts,
/// so the merge alone can leave an older post ahead of a newer one.
fn order_timed_slots(posts: Vec<PostRecord>) -> Vec<PostRecord> {
    let mut timed = Vec::new();
    let slots: Vec<Option<PostRecord>> = posts
        .into_iter()
        .map(|post| {
            if post.timestamp_resolved.is_some() {
                timed.push(post);
                None
            } else {
                Some(post)
            }
        })
        .collect();

    timed.sort_by(|a, b| b.timestamp_resolved.cmp(&a.timestamp_resolved));
    let mut timed = timed.into_iter();
    slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| timed.next()))
        .collect()
}

/// Stable top-down merge sort.
///
/// `feed_order` is not a total order and the standard sorts may panic on
/// such comparators. Any comparator here yields a permutation; equal
/// elements keep their relative order.
fn stable_merge_sort<T, F>(items: &mut Vec<T>, cmp: F)
where
    F: Fn(&T, &T) -> Ordering + Copy,
{
    if items.len() <= 1 {
        return;
    }
    let mut right = items.split_off(items.len() / 2);
    stable_merge_sort(items, cmp);
    stable_merge_sort(&mut right, cmp);

    let left = std::mem::take(items);
    items.reserve(left.len() + right.len());

    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(r, l) != Ordering::Less,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        if let Some(item) = next {
            items.push(item);
        }
    }
}

/// Aggregate counts over finalized posts.
pub fn compute_stats(posts: &[PostRecord]) -> RunStats {
    let mut stats = RunStats {
        total: posts.len(),
        ..RunStats::default()
    };

    for post in posts {
        if post.has_text() {
            stats.with_text += 1;
        }
        if post.has_media() {
            stats.with_media += 1;
        }
        if post.flags.is_retweet {
            stats.retweets += 1;
        }
        if post.flags.is_reply {
            stats.replies += 1;
        }
        if post.flags.has_thread {
            stats.threads += 1;
        }
        if post.flags.verified {
            stats.verified += 1;
        }
        if !post.language.is_empty() {
            stats.languages.insert(post.language.clone());
        }
        if let Some(ts) = post.timestamp_resolved {
            stats.earliest = Some(stats.earliest.map_or(ts, |e| e.min(ts)));
            stats.latest = Some(stats.latest.map_or(ts, |l| l.max(ts)));
        }
    }

    stats
}
