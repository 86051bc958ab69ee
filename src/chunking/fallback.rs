//! Character-based fallback splitter.
//!
//! Used when parsing fails, produces no root, or no splittable node is
//! found. Pure string operation; never fails.

use crate::types::CodeChunk;

/// Split `content` on paragraph and line boundaries while respecting
/// `chunk_size`. Produces a single chunk covering the whole file if the
/// content already fits.
pub fn fallback_chunks(content: &str, language: &str, file_path: &str, chunk_size: usize) -> Vec<CodeChunk> {
    if content.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_start_line = 1;
    let mut line_no = 1;

    for line in content.split_inclusive('\n') {
        let would_exceed = current.len() + line.len() > chunk_size;
        if would_exceed && !current.is_empty() {
            let end_line = line_no - 1;
            chunks.push(CodeChunk {
                content: std::mem::take(&mut current),
                start_line: current_start_line,
                end_line,
                language: language.to_string(),
                file_path: file_path.to_string(),
            });
            current_start_line = line_no;
        }
        current.push_str(line);
        line_no += 1;
    }

    if !current.is_empty() {
        chunks.push(CodeChunk {
            content: current,
            start_line: current_start_line,
            end_line: line_no - 1,
            language: language.to_string(),
            file_path: file_path.to_string(),
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(fallback_chunks("", "text", "f.txt", 100).is_empty());
    }

    #[test]
    fn whole_file_fits_in_one_chunk() {
        let content = "line one\nline two\n";
        let chunks = fallback_chunks(content, "text", "f.txt", 1000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, content);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 2);
    }

    #[test]
    fn splits_when_exceeding_chunk_size() {
        let content = "aaaaaaaaaa\nbbbbbbbbbb\ncccccccccc\n";
        let chunks = fallback_chunks(content, "text", "f.txt", 12);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(!c.content.is_empty());
        }
    }

    #[test]
    fn line_numbers_are_monotone_and_contiguous() {
        let content = "a\nb\nc\nd\ne\n";
        let chunks = fallback_chunks(content, "text", "f.txt", 4);
        let mut expected_start = 1;
        for c in &chunks {
            assert_eq!(c.start_line, expected_start);
            assert!(c.start_line <= c.end_line);
            expected_start = c.end_line + 1;
        }
    }

    #[test]
    fn oversized_single_line_is_force_included() {
        let content = "x".repeat(50);
        let chunks = fallback_chunks(&content, "text", "f.txt", 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content.len(), 50);
    }
}
