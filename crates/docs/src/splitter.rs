//! Optional splitting of long pages before embedding.

use crate::types::PageFragment;
use text_splitter::TextSplitter;

/// Split each fragment into pieces of at most `target_size` characters.
///
/// Pieces keep the label of the page they came from, so citations still
/// name the page. Whitespace-only pieces are dropped.
pub fn split_fragments(fragments: &[PageFragment], target_size: usize) -> Vec<PageFragment> {
    let splitter = TextSplitter::new(target_size);

    let pieces: Vec<PageFragment> = fragments
        .iter()
        .flat_map(|fragment| {
            splitter
                .chunks(&fragment.text)
                .filter(|piece| !piece.trim().is_empty())
                .map(|piece| PageFragment::new(piece, fragment.source_label.clone()))
                .collect::<Vec<_>>()
        })
        .collect();

    tracing::debug!(
        "Text splitter created {} pieces from {} pages",
        pieces.len(),
        fragments.len()
    );

    pieces
}
