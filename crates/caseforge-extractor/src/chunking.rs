//! Sentence-bounded text chunking

/// Splits document text into chunks of at most `max_chunk_size` characters
///
/// The limit applies to chunk content; the separator restored after the last sentence
/// is not counted, so text within the limit always stays whole. Sentences are never
/// split. A single sentence longer than the limit becomes its own oversized chunk.
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_chunk_size: usize,
}

impl TextChunker {
    /// Create a chunker with the given limit (characters)
    pub fn new(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }

    /// Split text into ordered, non-empty chunks
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for fragment in text.split(". ") {
            if fragment.trim().is_empty() {
                continue;
            }

            let content_len = fragment.trim_end().chars().count();
            if !current.is_empty() && current_len + content_len > self.max_chunk_size {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }

            let sentence = terminate(fragment);
            current_len += sentence.chars().count();
            current.push_str(&sentence);
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

/// Restore the separator consumed by the split
fn terminate(fragment: &str) -> String {
    let trimmed = fragment.trim_end();
    if trimmed.ends_with(['.', '!', '?']) {
        format!("{} ", trimmed)
    } else {
        format!("{}. ", trimmed)
    }
}
