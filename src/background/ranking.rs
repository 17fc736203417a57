//! Relevance ranking: score → threshold → per-type quota → merge → format.
//!
//! The ranker is a pure function over an in-memory item collection. It does no
//! I/O and keeps no state between calls; every intermediate [`ScoredItem`] is
//! local to one call of [`rank_at`].
//!
//! Scoring policy (fixed, not configurable):
//!
//! | Signal | Formula |
//! |--------|---------|
//! | similarity | cosine(query, item) |
//! | time weight | `1 + ln(1 + 3 / (age_days + 1))`, age defaults to 30 days |
//! | type weight | worldview 1.2, character 1.1, chapter 1.0 |
//! | threshold | `max(0.4, 0.5 - query_chars / 1000)` |

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::similarity::cosine_similarity;
use super::types::{BackgroundItem, BackgroundKind, ScoredItem};

/// Age assumed for items with no creation timestamp.
pub const DEFAULT_AGE_DAYS: f64 = 30.0;

/// Numerator of the recency bonus; larger values favour fresh items harder.
pub const RECENCY_BOOST: f64 = 3.0;

/// Score threshold for an empty query.
pub const THRESHOLD_CEILING: f64 = 0.5;

/// The threshold never drops below this, however long the query.
pub const THRESHOLD_FLOOR: f64 = 0.4;

/// Each this-many query characters lowers the threshold by 1.0.
pub const THRESHOLD_CHARS_SCALE: f64 = 1000.0;

/// Upper bound on items returned from one ranking call.
pub const MAX_RESULTS: usize = 5;

const MS_PER_DAY: f64 = 86_400_000.0;

const CHAPTER_HEADER: &str = "【前情回顾】以下是基于向量搜索匹配到的前文内容，仅供参考：";

/// Per-type multiplier reflecting how much each category matters to a prompt.
pub fn type_weight(kind: BackgroundKind) -> f64 {
    match kind {
        BackgroundKind::Worldview => 1.2,
        BackgroundKind::Character => 1.1,
        BackgroundKind::Chapter => 1.0,
    }
}

/// How many items of each type may survive into the merged result.
pub fn type_quota(kind: BackgroundKind) -> usize {
    match kind {
        BackgroundKind::Worldview => 2,
        BackgroundKind::Character => 2,
        BackgroundKind::Chapter => 1,
    }
}

/// Multiplicative recency bonus, always `>= 1.0`, decreasing with age.
pub fn time_weight(age_days: f64) -> f64 {
    1.0 + (RECENCY_BOOST / (age_days + 1.0)).ln_1p()
}

/// Age of an item in fractional days at `now`.
///
/// Timestamps in the future count as age 0.
pub fn age_days(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match created_at {
        Some(ts) => ((now - ts).num_milliseconds() as f64 / MS_PER_DAY).max(0.0),
        None => DEFAULT_AGE_DAYS,
    }
}

/// Minimum score an item must strictly exceed for a query of this text.
///
/// Longer queries are more specific, so they get a looser cutoff. Length is
/// counted in characters, not bytes.
pub fn adaptive_threshold(query_text: &str) -> f64 {
    let chars = query_text.chars().count() as f64;
    (THRESHOLD_CEILING - chars / THRESHOLD_CHARS_SCALE).max(THRESHOLD_FLOOR)
}

/// Score every item that carries an embedding. Input order is preserved.
pub fn score_items(
    query_embedding: &[f32],
    items: &[BackgroundItem],
    now: DateTime<Utc>,
) -> Vec<ScoredItem> {
    items
        .iter()
        .filter(|item| item.embedding.is_some())
        .map(|item| {
            let similarity = cosine_similarity(Some(query_embedding), item.embedding.as_deref());
            let score = similarity
                * time_weight(age_days(item.created_at, now))
                * type_weight(item.kind);
            ScoredItem {
                item: item.clone(),
                similarity,
                score,
            }
        })
        .collect()
}

/// Rank `items` against a query and return the selected items in listing order.
///
/// An empty result means nothing cleared the adaptive threshold.
pub fn rank_at(
    query_text: &str,
    query_embedding: &[f32],
    items: &[BackgroundItem],
    now: DateTime<Utc>,
) -> Vec<ScoredItem> {
    let scored = score_items(query_embedding, items, now);
    let candidates = scored.len();

    let threshold = adaptive_threshold(query_text);
    let survivors: Vec<ScoredItem> = scored
        .into_iter()
        .filter(|s| s.score > threshold)
        .collect();

    let mut merged: Vec<ScoredItem> = BackgroundKind::ALL
        .iter()
        .flat_map(|&kind| top_by_kind(&survivors, kind, type_quota(kind)))
        .collect();
    merged.sort_by(by_score_desc);
    dedup_payloads(&mut merged);
    merged.truncate(MAX_RESULTS);

    // Stable: keeps score order inside each type.
    merged.sort_by(|a, b| b.kind().precedence().cmp(&a.kind().precedence()));

    tracing::debug!(
        candidates,
        survivors = survivors.len(),
        selected = merged.len(),
        threshold,
        "ranked background items"
    );

    merged
}

/// [`rank_at`] against the current wall clock.
pub fn rank(query_text: &str, query_embedding: &[f32], items: &[BackgroundItem]) -> Vec<ScoredItem> {
    rank_at(query_text, query_embedding, items, Utc::now())
}

/// Render one item as a labelled prompt block.
pub fn format_item(scored: &ScoredItem) -> String {
    let item = &scored.item;
    match item.kind {
        BackgroundKind::Worldview => format!("【世界观】{}", item.content),
        BackgroundKind::Character => {
            let body = item
                .description
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or(&item.content);
            format!("【人物设定】{}：{}", item.name.as_deref().unwrap_or_default(), body)
        }
        BackgroundKind::Chapter => format!("{CHAPTER_HEADER}\n{}", item.content),
    }
}

/// Join formatted blocks with a blank line. `None` for an empty selection so
/// callers can leave background out of the prompt entirely.
pub fn format_context(selected: &[ScoredItem]) -> Option<String> {
    if selected.is_empty() {
        return None;
    }
    Some(
        selected
            .iter()
            .map(format_item)
            .collect::<Vec<_>>()
            .join("\n\n"),
    )
}

fn by_score_desc(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
}

/// Top `count` survivors of one type by score, ties kept in input order.
fn top_by_kind(survivors: &[ScoredItem], kind: BackgroundKind, count: usize) -> Vec<ScoredItem> {
    let mut of_kind: Vec<ScoredItem> = survivors
        .iter()
        .filter(|s| s.kind() == kind)
        .cloned()
        .collect();
    of_kind.sort_by(by_score_desc);
    of_kind.truncate(count);
    of_kind
}

/// Drop later records whose payload repeats an earlier one.
fn dedup_payloads(items: &mut Vec<ScoredItem>) {
    let mut kept: Vec<ScoredItem> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if !kept.iter().any(|k| k.same_payload(&item)) {
            kept.push(item);
        }
    }
    *items = kept;
}
