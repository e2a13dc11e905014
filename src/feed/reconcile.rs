use std::cmp::Ordering;
use chrono::DateTime;
use crate::models::{map_pool_to_token, Category, FeedSnapshot, FeedUpdate, TokenWithPool, UpdateKind};

/// Upper bound on the length of every bucket.
pub const MAX_LIST_SIZE: usize = 30;

/// Milliseconds since the epoch, or 0 for a missing/unparseable timestamp.
fn timestamp_millis(value: Option<&str>) -> i64 {
    value
        .filter(|v| !v.is_empty())
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

fn first_non_empty<'a>(candidates: &[Option<&'a String>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .map(|s| s.as_str())
        .find(|s| !s.is_empty())
}

fn listed_at(token: &TokenWithPool) -> i64 {
    timestamp_millis(first_non_empty(&[
        token.pool.created_at.as_ref(),
        token.created_at.as_ref(),
    ]))
}

fn graduated_at(token: &TokenWithPool) -> i64 {
    timestamp_millis(first_non_empty(&[
        token.pool.base_asset.graduated_at.as_ref(),
        token.pool.graduated_at.as_ref(),
    ]))
}

fn is_priority(token: &TokenWithPool, priority: Option<&str>) -> bool {
    match priority {
        Some(id) if !id.is_empty() => token.pool.base_asset.id == id || token.id == id,
        _ => false,
    }
}

/// Orders and caps each bucket:
/// recent by listing time, about-to-graduate by curve progress, graduated by
/// graduation time with the priority token pinned first. All descending; ties
/// keep their incoming order.
pub fn sort_and_truncate(mut lists: FeedSnapshot, priority: Option<&str>) -> FeedSnapshot {
    lists.recent.sort_by(|a, b| listed_at(b).cmp(&listed_at(a)));
    lists.recent.truncate(MAX_LIST_SIZE);

    lists.about_to_graduate.sort_by(|a, b| {
        b.pool
            .bonding_curve
            .partial_cmp(&a.pool.bonding_curve)
            .unwrap_or(Ordering::Equal)
    });
    lists.about_to_graduate.truncate(MAX_LIST_SIZE);

    lists.graduated.sort_by(|a, b| {
        match (is_priority(a, priority), is_priority(b, priority)) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => graduated_at(b).cmp(&graduated_at(a)),
        }
    });
    lists.graduated.truncate(MAX_LIST_SIZE);

    lists
}

fn upsert(list: &mut Vec<TokenWithPool>, token: TokenWithPool) {
    match list.iter().position(|t| t.pool.id == token.pool.id) {
        Some(idx) => list[idx] = token,
        None => list.push(token),
    }
}

/// Applies a batch of stream events, in order, to a copy of `current` and
/// returns the re-sorted, truncated result.
pub fn apply_updates(
    current: &FeedSnapshot,
    updates: &[FeedUpdate],
    priority: Option<&str>,
) -> FeedSnapshot {
    let mut next = current.clone();

    for update in updates {
        let pool = &update.pool;
        if pool.id.is_empty() {
            continue;
        }

        match update.kind {
            UpdateKind::New => {
                upsert(&mut next.recent, map_pool_to_token(pool, Category::New));
            }
            UpdateKind::Update => {
                for list in [&mut next.recent, &mut next.about_to_graduate] {
                    if let Some(idx) = list.iter().position(|t| t.pool.id == pool.id) {
                        let category = list[idx].category;
                        list[idx] = map_pool_to_token(pool, category);
                    }
                }
                if let Some(idx) = next.graduated.iter().position(|t| t.pool.id == pool.id) {
                    next.graduated[idx] = map_pool_to_token(pool, Category::Bonded);
                }
            }
            UpdateKind::Graduated => {
                next.recent.retain(|t| t.pool.id != pool.id);
                next.about_to_graduate.retain(|t| t.pool.id != pool.id);
                upsert(&mut next.graduated, map_pool_to_token(pool, Category::Bonded));
            }
        }
    }

    sort_and_truncate(next, priority)
}
