//! Fragment-aware pseudonymization
//!
//! Entity spans are global char offsets into the flattened text. Each span
//! is projected onto the fragments it intersects and the local ranges are
//! rewritten in an arena of fragment buffers. An entity that straddles a
//! fragment boundary gets its pseudonym in the first fragment only; the
//! overlapped ranges of the later fragments are emptied. Fragment count,
//! order and locations never change.

use super::mapping::MappingStore;
use crate::detection::DetectedEntity;
use crate::domain::text::replace_char_range;
use crate::domain::{Document, Result, TextFragment};

/// Fragment-local range touched by an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LocalRange {
    fragment: usize,
    start: usize,
    end: usize,
}

/// Char spans of the fragments, recomputed from their texts
fn fragment_spans(fragments: &[TextFragment]) -> Vec<(usize, usize)> {
    let mut offset = 0;
    fragments
        .iter()
        .map(|fragment| {
            let start = offset;
            offset += fragment.char_len();
            (start, offset)
        })
        .collect()
}

/// Local ranges of every fragment intersecting `[start, end)`, in fragment order
fn affected_ranges(spans: &[(usize, usize)], start: usize, end: usize) -> Vec<LocalRange> {
    spans
        .iter()
        .enumerate()
        .filter(|(_, &(frag_start, frag_end))| frag_start < end && start < frag_end)
        .map(|(fragment, &(frag_start, frag_end))| LocalRange {
            fragment,
            start: start.max(frag_start) - frag_start,
            end: end.min(frag_end) - frag_start,
        })
        .collect()
}

/// Replace every entity with its pseudonym
///
/// Pseudonyms come from `store`, created on first sighting. The input
/// document is left untouched; the returned document carries the same
/// locations and metadata with rewritten texts and recomputed offsets.
/// Fails only when the store cannot issue a new pseudonym.
pub fn pseudonymize(
    document: &Document,
    entities: &[DetectedEntity],
    store: &mut MappingStore,
) -> Result<Document> {
    let spans = fragment_spans(&document.fragments);
    let mut buffers: Vec<String> = document
        .fragments
        .iter()
        .map(|fragment| fragment.text.clone())
        .collect();

    // Back to front, so rewrites never shift a range still to be applied
    let mut ordered: Vec<&DetectedEntity> = entities.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut replaced = 0;
    let mut straddling = 0;
    for entity in ordered {
        let ranges = affected_ranges(&spans, entity.start, entity.end);
        let Some((first, rest)) = ranges.split_first() else {
            tracing::debug!(
                start = entity.start,
                end = entity.end,
                "Entity outside document text, skipped"
            );
            continue;
        };

        let pseudonym = store.get_or_create(&entity.text, entity.category)?;
        replace_char_range(&mut buffers[first.fragment], first.start, first.end, &pseudonym);
        for range in rest {
            replace_char_range(&mut buffers[range.fragment], range.start, range.end, "");
        }

        replaced += 1;
        if !rest.is_empty() {
            straddling += 1;
        }
    }

    let fragments = document
        .fragments
        .iter()
        .zip(buffers)
        .map(|(fragment, text)| TextFragment::new(text, fragment.location.clone()))
        .collect();

    tracing::debug!(
        fragments = document.fragments.len(),
        replaced,
        straddling,
        "Pseudonymization applied"
    );

    Ok(Document::new(fragments, document.metadata.clone()))
}
