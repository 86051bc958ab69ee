//! The syntax-aware chunker (C1).
//!
//! Implements the algorithm in spec §4.1: consecutive-import grouping,
//! pre-order AST traversal over a fixed splittable-node taxonomy,
//! length-based refinement, range dedup, and optional character overlap.
//! Falls back to [`fallback_chunks`] whenever parsing fails, yields no
//! root, or finds no splittable node; this function never fails.

use std::collections::HashSet;

use tree_sitter::{Node, Parser};

use super::fallback::fallback_chunks;
use super::grammar::SyntaxGrammar;
use crate::types::CodeChunk;

/// Stateless chunker configured with a size bound and optional overlap.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap: 0,
        }
    }

    pub fn with_overlap(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Decompose `content` into an ordered list of chunks. Never fails.
    pub fn chunk(&self, content: &str, language: &str, file_path: &str) -> Vec<CodeChunk> {
        if content.is_empty() {
            return Vec::new();
        }

        let Some(grammar) = SyntaxGrammar::from_tag(language) else {
            return fallback_chunks(content, language, file_path, self.chunk_size);
        };

        let mut parser = Parser::new();
        if parser.set_language(&grammar.tree_sitter_language()).is_err() {
            return fallback_chunks(content, language, file_path, self.chunk_size);
        }

        let Some(tree) = parser.parse(content, None) else {
            return fallback_chunks(content, language, file_path, self.chunk_size);
        };

        let root = tree.root_node();
        if root.is_error() {
            return fallback_chunks(content, language, file_path, self.chunk_size);
        }

        let source = content.as_bytes();
        let mut chunks: Vec<CodeChunk> = Vec::new();
        let mut consumed: HashSet<(usize, usize)> = HashSet::new();

        // Step 2: consecutive-import grouping.
        group_consecutive_imports(root, source, grammar, language, file_path, &mut chunks, &mut consumed);

        // Step 3: pre-order traversal.
        let mut traversal_chunks = Vec::new();
        visit_node(root, source, grammar, &consumed, language, file_path, &mut traversal_chunks, 0);
        let traversal_emitted = !traversal_chunks.is_empty();
        chunks.extend(traversal_chunks);

        // Step 4: whole-file fallback chunk if traversal emitted nothing.
        if !traversal_emitted {
            chunks.push(CodeChunk {
                content: content.to_string(),
                start_line: 1,
                end_line: line_count(content),
                language: language.to_string(),
                file_path: file_path.to_string(),
            });
        }

        // Step 5: refinement.
        let refined: Vec<CodeChunk> = chunks
            .into_iter()
            .flat_map(|c| refine_chunk(&c, self.chunk_size))
            .collect();

        // Step 6: dedup by (start_line, end_line), first occurrence wins.
        let deduped = dedup_by_range(refined);

        // Step 7: optional overlap.
        apply_overlap(deduped, self.chunk_overlap)
    }
}

fn line_count(content: &str) -> i32 {
    let n = content.lines().count().max(1);
    n as i32
}

#[allow(clippy::too_many_arguments)]
fn group_consecutive_imports(
    root: Node,
    source: &[u8],
    grammar: SyntaxGrammar,
    language: &str,
    file_path: &str,
    chunks: &mut Vec<CodeChunk>,
    consumed: &mut HashSet<(usize, usize)>,
) {
    let mut cursor = root.walk();
    let mut accumulated: Vec<Node> = Vec::new();

    for child in root.children(&mut cursor) {
        if child.kind() == "comment" {
            continue;
        }
        if grammar.is_import_kind(child.kind()) {
            accumulated.push(child);
            continue;
        }
        break;
    }

    if accumulated.len() >= 2 {
        let first = accumulated.first().unwrap();
        let last = accumulated.last().unwrap();
        let start_byte = first.start_byte();
        let end_byte = last.end_byte();
        let text = String::from_utf8_lossy(&source[start_byte..end_byte]).to_string();
        chunks.push(CodeChunk {
            content: text,
            start_line: first.start_position().row as i32 + 1,
            end_line: last.end_position().row as i32 + 1,
            language: language.to_string(),
            file_path: file_path.to_string(),
        });
        for node in &accumulated {
            consumed.insert((node.start_byte(), node.end_byte()));
        }
    }
}

const MAX_TRAVERSAL_DEPTH: usize = 512;

#[allow(clippy::too_many_arguments)]
fn visit_node(
    node: Node,
    source: &[u8],
    grammar: SyntaxGrammar,
    consumed: &HashSet<(usize, usize)>,
    language: &str,
    file_path: &str,
    out: &mut Vec<CodeChunk>,
    depth: usize,
) {
    if depth > MAX_TRAVERSAL_DEPTH {
        return;
    }

    let kind = node.kind();
    if grammar.is_splittable_kind(kind) {
        let range = (node.start_byte(), node.end_byte());
        if !consumed.contains(&range) {
            let text = String::from_utf8_lossy(&source[range.0..range.1]);
            if !text.trim().is_empty() {
                out.push(CodeChunk {
                    content: text.to_string(),
                    start_line: node.start_position().row as i32 + 1,
                    end_line: node.end_position().row as i32 + 1,
                    language: language.to_string(),
                    file_path: file_path.to_string(),
                });
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_node(child, source, grammar, consumed, language, file_path, out, depth + 1);
    }
}

/// Split a single chunk into line-accumulated sub-chunks once it exceeds
/// `chunk_size`, preserving line-number accounting.
fn refine_chunk(chunk: &CodeChunk, chunk_size: usize) -> Vec<CodeChunk> {
    if chunk.content.len() <= chunk_size {
        return vec![chunk.clone()];
    }

    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_start_line = chunk.start_line;
    let mut line_no = chunk.start_line;

    for line in chunk.content.split_inclusive('\n') {
        let would_exceed = current.len() + line.len() > chunk_size;
        if would_exceed && !current.is_empty() {
            result.push(CodeChunk {
                content: std::mem::take(&mut current),
                start_line: current_start_line,
                end_line: line_no - 1,
                language: chunk.language.clone(),
                file_path: chunk.file_path.clone(),
            });
            current_start_line = line_no;
        }
        current.push_str(line);
        line_no += 1;
    }

    if !current.is_empty() {
        result.push(CodeChunk {
            content: current,
            start_line: current_start_line,
            end_line: line_no - 1,
            language: chunk.language.clone(),
            file_path: chunk.file_path.clone(),
        });
    }

    result
}

fn dedup_by_range(chunks: Vec<CodeChunk>) -> Vec<CodeChunk> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(chunks.len());
    for c in chunks {
        if seen.insert((c.start_line, c.end_line)) {
            out.push(c);
        }
    }
    out
}

fn tail_chars(s: &str, n: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= n {
        return s.to_string();
    }
    let skip = char_count - n;
    s.chars().skip(skip).collect()
}

fn apply_overlap(chunks: Vec<CodeChunk>, chunk_overlap: usize) -> Vec<CodeChunk> {
    if chunk_overlap == 0 || chunks.len() < 2 {
        return chunks;
    }

    let mut out = Vec::with_capacity(chunks.len());
    let mut prev_original_content: Option<String> = None;

    for (i, mut c) in chunks.into_iter().enumerate() {
        if i == 0 {
            prev_original_content = Some(c.content.clone());
            out.push(c);
            continue;
        }

        let prev = prev_original_content.as_ref().unwrap();
        let tail = tail_chars(prev, chunk_overlap);
        let added_lines = tail.matches('\n').count() as i32;
        prev_original_content = Some(c.content.clone());

        c.start_line = (c.start_line - added_lines).max(1);
        let mut new_content = tail;
        new_content.push_str(&c.content);
        c.content = new_content;
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_function_becomes_a_chunk() {
        let chunker = Chunker::new(2000);
        let chunks = chunker.chunk("fn main() {\n    println!(\"hi\");\n}\n", "rust", "src/main.rs");
        assert!(chunks.iter().any(|c| c.content.contains("fn main")));
    }

    #[test]
    fn unparseable_language_falls_back() {
        let chunker = Chunker::new(2000);
        let chunks = chunker.chunk("some\nplain\ntext\n", "cobol", "f.cob");
        assert!(!chunks.is_empty());
    }

    #[test]
    fn parser_errors_degrade_to_fallback() {
        let chunker = Chunker::new(2000);
        // Deliberately malformed Rust: unterminated construct.
        let chunks = chunker.chunk("fn main( {{{ ??? ***", "rust", "src/bad.rs");
        assert!(!chunks.is_empty());
    }

    #[test]
    fn every_chunk_respects_size_bound_after_refinement() {
        let chunker = Chunker::new(40);
        let src = "fn a() {\n    let x = 1;\n    let y = 2;\n    let z = 3;\n}\n";
        let chunks = chunker.chunk(src, "rust", "f.rs");
        for c in &chunks {
            assert!(c.content.len() <= 40, "chunk exceeded bound: {:?}", c.content);
        }
    }

    #[test]
    fn line_numbers_are_monotone_and_one_based() {
        let chunker = Chunker::new(2000);
        let src = "fn a() {}\nfn b() {}\nfn c() {}\n";
        let chunks = chunker.chunk(src, "rust", "f.rs");
        for c in &chunks {
            assert!(c.start_line >= 1);
            assert!(c.start_line <= c.end_line);
        }
    }

    // Boundary scenario 1 (spec §8): TSX grouped imports.
    #[test]
    fn tsx_groups_consecutive_imports_into_one_chunk() {
        let chunker = Chunker::new(2000);
        let src = "import React from 'react';\nimport { useState } from 'react';\nimport './App.css';\n\nfunction App() {\n  return null;\n}\n";
        let chunks = chunker.chunk(src, "tsx", "App.tsx");

        let import_chunk = chunks
            .iter()
            .find(|c| c.start_line == 1 && c.content.contains("React") && c.content.contains("App.css"))
            .expect("expected one grouped import chunk spanning lines 1-3");
        assert_eq!(import_chunk.end_line, 3);
        assert!(chunks.len() >= 2);
        assert!(!chunks.iter().any(|c| c.start_line == 1 && c.end_line == 1));
    }

    // Boundary scenario 2 (spec §8): interleaved imports.
    #[test]
    fn interleaved_imports_are_not_grouped_across_other_statements() {
        let chunker = Chunker::new(2000);
        let src = "import a from 'a';\nimport b from 'b';\n\nconst x = 1;\n\nimport c from 'c';\n";
        let chunks = chunker.chunk(src, "typescript", "f.ts");

        let grouped = chunks
            .iter()
            .find(|c| c.start_line == 1 && c.end_line == 2)
            .expect("expected grouped chunk for lines 1-2");
        assert!(!grouped.content.contains("from 'c'"));

        assert!(chunks.iter().any(|c| c.start_line >= 4 && c.content.contains("const x")));
    }

    // Boundary scenario 3 (spec §8): duplicate-range dedup.
    #[test]
    fn duplicate_range_collapses_to_one_chunk() {
        let chunker = Chunker::new(2000);
        let src = "export function C(){return 1;}\n";
        let chunks = chunker.chunk(src, "tsx", "f.tsx");

        let matching: Vec<_> = chunks.iter().filter(|c| c.start_line == 1 && c.end_line == 1).collect();
        assert_eq!(matching.len(), 1);
    }

    #[test]
    fn overlap_prepends_tail_of_previous_chunk() {
        let chunker = Chunker::with_overlap(2000, 10);
        let src = "fn a() {\n    1\n}\nfn b() {\n    2\n}\n";
        let chunks = chunker.chunk(src, "rust", "f.rs");
        assert!(chunks.len() >= 2);
        for c in chunks.iter().skip(1) {
            assert!(c.start_line >= 1);
        }
    }

    #[test]
    fn zero_overlap_leaves_chunks_unchanged() {
        let a = apply_overlap(
            vec![
                CodeChunk { content: "one".into(), start_line: 1, end_line: 1, language: "rust".into(), file_path: "f".into() },
                CodeChunk { content: "two".into(), start_line: 2, end_line: 2, language: "rust".into(), file_path: "f".into() },
            ],
            0,
        );
        assert_eq!(a[1].content, "two");
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        let chunker = Chunker::new(2000);
        assert!(chunker.chunk("", "rust", "f.rs").is_empty());
    }
}
