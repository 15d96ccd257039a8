//! Sentence-aligned chunking with character offsets.

use std::ops::Range;

use plagdet_core::traits::SentenceSplitter;
use plagdet_core::types::TextSpan;

/// Split `text` into chunks of whole sentences.
///
/// Sentences are accumulated greedily; when adding the next sentence would
/// push the trimmed buffer past `max_chunk_chars`, the buffer is sealed and
/// the sentence starts a new one. A sentence longer than the limit becomes
/// its own chunk. Offsets are char offsets into `text`; consecutive chunks
/// never overlap.
pub fn chunk_text(text: &str, max_chunk_chars: usize, splitter: &dyn SentenceSplitter) -> Vec<TextSpan> {
    let mut chunks = Vec::new();
    let mut cursor = CharCursor::default();
    let mut buffer: Option<Range<usize>> = None;

    for sentence in splitter.sentence_spans(text) {
        if sentence.is_empty() {
            continue;
        }
        buffer = match buffer {
            None => Some(sentence),
            Some(current) => {
                let extended = current.start..sentence.end;
                if text[extended.clone()].trim().chars().count() <= max_chunk_chars {
                    Some(extended)
                } else {
                    seal(text, current, &mut cursor, &mut chunks);
                    Some(sentence)
                }
            }
        };
    }
    if let Some(current) = buffer {
        seal(text, current, &mut cursor, &mut chunks);
    }
    chunks
}

fn seal(text: &str, range: Range<usize>, cursor: &mut CharCursor, chunks: &mut Vec<TextSpan>) {
    let raw = &text[range.clone()];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let start_byte = range.start + (raw.len() - raw.trim_start().len());
    let start_offset = cursor.advance_to(text, start_byte);
    let char_len = trimmed.chars().count();
    chunks.push(TextSpan {
        text: trimmed.to_string(),
        start_offset,
        end_offset: start_offset + char_len,
        sequence_id: chunks.len(),
    });
}

/// Converts increasing byte positions to char positions without rescanning
/// from the start of the text.
#[derive(Default)]
struct CharCursor {
    byte: usize,
    chars: usize,
}

impl CharCursor {
    fn advance_to(&mut self, text: &str, byte: usize) -> usize {
        if byte < self.byte {
            *self = Self::default();
        }
        self.chars += text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}
