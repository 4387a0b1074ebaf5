//! Chapter content to chunk texts.

use crate::config::SegmenterConfig;
use crate::error::{NarrationError, Result};
use crate::segmenter::{group_sentences_into_chunks, split_into_sentences};
use bridge_traits::chapter::ChapterContent;

/// Segment a chapter body, optionally reading the title first as its own
/// chunk.
///
/// A blank title is skipped. Fails with [`NarrationError::EmptyText`] only if
/// neither the title nor the body has anything to speak.
pub fn build_chunk_texts(
    chapter: &ChapterContent,
    segmenter: &SegmenterConfig,
    include_title: bool,
) -> Result<Vec<String>> {
    segmenter.validate()?;

    let mut texts = Vec::new();

    let title = chapter.title.split_whitespace().collect::<Vec<_>>().join(" ");
    if include_title && !title.is_empty() {
        texts.push(title);
    }

    let sentences = split_into_sentences(&chapter.content);
    texts.extend(group_sentences_into_chunks(
        &sentences,
        segmenter.min_size,
        segmenter.max_size,
    ));

    if texts.is_empty() {
        return Err(NarrationError::EmptyText);
    }
    Ok(texts)
}
