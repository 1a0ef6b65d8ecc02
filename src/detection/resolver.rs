//! Overlap resolution between detections

use super::models::DetectedEntity;

/// Reduce detections to a non-overlapping set
///
/// Candidates are visited in order of start ascending, then length
/// descending; the sort is stable so input order breaks remaining ties. A
/// candidate is accepted only if it strictly outranks every already accepted
/// entity it overlaps, by `(confidence, length, specificity)`. Those
/// overlapped entities are then removed. Otherwise the candidate is dropped
/// and the accepted set is left as is, so an incumbent wins on equal rank.
///
/// The result is sorted by start ascending.
pub fn resolve_overlaps(mut entities: Vec<DetectedEntity>) -> Vec<DetectedEntity> {
    if entities.len() < 2 {
        return entities;
    }

    entities.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.len().cmp(&a.len())));

    let mut accepted: Vec<DetectedEntity> = Vec::with_capacity(entities.len());
    for candidate in entities {
        let wins = accepted
            .iter()
            .filter(|kept| kept.overlaps(&candidate))
            .all(|kept| candidate.outranks(kept));

        if wins {
            accepted.retain(|kept| !kept.overlaps(&candidate));
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|e| e.start);
    accepted
}
