use std::cmp::Ordering;

use crate::models::Token;

/// Total order over the tokens queued for one doctor. The caller scopes the
/// input to a single doctor beforehand.
///
/// Multi-key sort, most significant first:
/// 1. emergency tokens jump to the head regardless of every other key,
/// 2. remaining priorities by fixed weight (urgent < high < normal < low),
/// 3. ties broken by existing queue position (arrival order).
///
/// Completed and in-consultation tokens are excluded; only the
/// waiting/checked-in/delayed subset holds a queue slot.
pub fn rank_queue(mut tokens: Vec<Token>) -> Vec<Token> {
    tokens.retain(|t| t.status.is_rankable());
    tokens.sort_by(queue_order);
    tokens
}

pub fn queue_order(a: &Token, b: &Token) -> Ordering {
    match (a.priority.is_emergency(), b.priority.is_emergency()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .priority
            .weight()
            .cmp(&b.priority.weight())
            .then(a.position_in_queue.cmp(&b.position_in_queue)),
    }
}
