//! Splits a live text stream into speakable chunks.
//!
//! Fragments arrive incrementally (e.g. tokens from a language model) and
//! accumulate in a buffer. A chunk is emitted when the character just
//! appended is a sentence/clause boundary and the trimmed buffer has grown
//! past the current threshold. Thresholds double after every emission
//! (20, 40, 80, ... characters): short early chunks get playback started
//! quickly, later chunks amortize per-call synthesis overhead.

/// Sentence and clause boundary characters, covering both ASCII and CJK
/// punctuation.
const BOUNDARY_CHARS: &[char] = &[
    '\n', '。', '.', '，', ',', '；', ';', '！', '!', '？', '?', '、',
];

const BASE_THRESHOLD: usize = 10;

/// Per-stream accumulation state. Create one per incoming text stream;
/// never shared across streams.
#[derive(Debug, Default)]
pub struct StreamSegmenter {
    buffer: String,
    emitted: u32,
}

impl StreamSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum trimmed length (in characters) the buffer must reach before
    /// the next chunk may be emitted.
    fn threshold(&self) -> usize {
        BASE_THRESHOLD * 2usize.pow(self.emitted + 1)
    }

    /// Append a fragment, returning any chunks that became ready. The
    /// emission condition is evaluated per appended character, so a single
    /// large fragment can produce several chunks.
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        let mut ready = Vec::new();
        for ch in fragment.chars() {
            self.buffer.push(ch);
            if BOUNDARY_CHARS.contains(&ch)
                && self.buffer.trim().chars().count() >= self.threshold()
            {
                let chunk = self.buffer.trim().to_string();
                self.buffer.clear();
                self.emitted += 1;
                ready.push(chunk);
            }
        }
        ready
    }

    /// Flush the final partial buffer once the input stream has ended.
    /// Returns `None` when nothing speakable remains.
    pub fn finish(&mut self) -> Option<String> {
        let rest = self.buffer.trim();
        if rest.is_empty() {
            return None;
        }
        let chunk = rest.to_string();
        self.buffer.clear();
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_at_boundary_once_threshold_reached() {
        let mut seg = StreamSegmenter::new();
        let mut chunks = seg.push("Hello world. This is ");
        chunks.extend(seg.push("a test."));

        assert_eq!(chunks, vec!["Hello world. This is a test."]);
        let first = &chunks[0];
        assert!(first.trim().chars().count() >= 20);
        assert!(first.ends_with('.'));
        assert_eq!(seg.finish(), None);
    }

    #[test]
    fn short_text_only_flushes_at_end() {
        let mut seg = StreamSegmenter::new();
        assert!(seg.push("Hi there. ").is_empty());
        assert_eq!(seg.finish(), Some("Hi there.".to_string()));
    }

    #[test]
    fn thresholds_double_after_each_emission() {
        let mut seg = StreamSegmenter::new();
        // 25 chars ending in a period: over the first threshold of 20.
        let chunks = seg.push("aaaaaaaaaaaaaaaaaaaaaaaa.");
        assert_eq!(chunks.len(), 1);
        // The same again is under the new threshold of 40.
        assert!(seg.push("aaaaaaaaaaaaaaaaaaaaaaaa.").is_empty());
        // Another 25 pushes the trimmed buffer to 50: emitted.
        let chunks = seg.push("aaaaaaaaaaaaaaaaaaaaaaaa.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chars().count(), 50);
    }

    #[test]
    fn cjk_boundaries_count_in_characters_not_bytes() {
        let mut seg = StreamSegmenter::new();
        // 19 ideographs + CJK comma: exactly 20 chars, at the boundary.
        let text = "很".repeat(19) + "，";
        let chunks = seg.push(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chars().count(), 20);
    }

    #[test]
    fn never_emits_empty_chunks() {
        let mut seg = StreamSegmenter::new();
        assert!(seg.push("   \n  \n ").is_empty());
        assert_eq!(seg.finish(), None);
    }

    #[test]
    fn boundary_without_threshold_does_not_emit() {
        let mut seg = StreamSegmenter::new();
        assert!(seg.push("Short. Bit. More.").is_empty());
        assert_eq!(seg.finish(), Some("Short. Bit. More.".to_string()));
    }
}
