//! The lexer's states.
//!
//! Every `process` call starts at a non-whitespace byte and returns the index
//! of the last byte it consumed, the line type so far and the state to
//! continue in. A call never consumes past a newline, so the driver always
//! sees line boundaries.

use crate::job::FileJob;
use crate::language::trie::TokenKind;
use crate::lexer::{check_for_match_single, is_binary, is_whitespace, judge_escape, LineType, Scan};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State<'a> {
    /// Nothing but whitespace seen on this line so far
    Blank,
    Code,
    CommentSingle,
    /// Pending end markers, innermost last. Never empty.
    CommentMulti { stack: Vec<&'a [u8]> },
    String { end: &'a [u8], skip_escape: bool },
    /// A string that counts as a comment when it is a statement on its own
    DocString { end: &'a [u8], skip_escape: bool },
}

impl<'a> State<'a> {
    pub fn process(
        self,
        scan: &Scan<'a>,
        job: &mut FileJob,
        index: usize,
        line_type: LineType,
    ) -> (usize, LineType, State<'a>) {
        match self {
            State::Blank => blank(scan, job, index, line_type),
            State::Code => code(scan, job, index),
            State::CommentSingle => {
                let end = scan.content[index..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(scan.last(), |offset| index + offset);
                (end, line_type, State::CommentSingle)
            }
            State::CommentMulti { stack } => comment_multi(scan, index, line_type, stack),
            State::String { end, skip_escape } => string(scan, index, end, skip_escape),
            State::DocString { end, skip_escape } => {
                doc_string(scan, index, line_type, end, skip_escape)
            }
        }
    }

    /// Line type and state the next line starts with.
    pub fn reset(self) -> (LineType, State<'a>) {
        match self {
            State::Blank | State::Code | State::CommentSingle => (LineType::Blank, State::Blank),
            state @ State::CommentMulti { .. } => (LineType::Comment, state),
            state @ State::String { .. } => (LineType::Code, state),
            state @ State::DocString { .. } => (LineType::Comment, state),
        }
    }
}

/// Complexity keywords only count at the start of a word.
#[inline]
fn at_word_boundary(content: &[u8], index: usize) -> bool {
    index == 0 || is_whitespace(content[index - 1])
}

fn blank<'a>(
    scan: &Scan<'a>,
    job: &mut FileJob,
    index: usize,
    line_type: LineType,
) -> (usize, LineType, State<'a>) {
    let content = scan.content;

    if let Some(token) = scan.feature.tokens.match_at(&content[index..]) {
        let last = index + token.len - 1;
        match token.kind {
            TokenKind::MultiLineComment => {
                return (
                    last,
                    line_type.with_comment(),
                    State::CommentMulti {
                        stack: vec![token.close],
                    },
                );
            }
            TokenKind::SingleLineComment => {
                return (last, line_type.with_comment(), State::CommentSingle);
            }
            TokenKind::String if token.doc_string => {
                return (
                    last,
                    line_type.with_comment(),
                    State::DocString {
                        end: token.close,
                        skip_escape: token.ignore_escape,
                    },
                );
            }
            TokenKind::String => {
                return (
                    last,
                    LineType::Code,
                    State::String {
                        end: token.close,
                        skip_escape: token.ignore_escape,
                    },
                );
            }
            TokenKind::Complexity => {
                if at_word_boundary(content, index) {
                    job.complexity += 1;
                }
                return (index, line_type, State::Blank);
            }
        }
    }

    if is_binary(scan, index, content[index]) {
        job.binary = true;
        return (index, LineType::Code, State::Blank);
    }

    (index, LineType::Code, State::Code)
}

fn code<'a>(scan: &Scan<'a>, job: &mut FileJob, index: usize) -> (usize, LineType, State<'a>) {
    let content = scan.content;

    for i in index..content.len() {
        let byte = content[i];

        if byte == b'\n' {
            return (i, LineType::Code, State::Code);
        }

        if is_binary(scan, i, byte) {
            job.binary = true;
            return (i, LineType::Code, State::Code);
        }

        if !scan.feature.process_mask.should_process(byte) {
            continue;
        }

        let Some(token) = scan.feature.tokens.match_at(&content[i..]) else {
            continue;
        };
        let last = i + token.len - 1;

        match token.kind {
            TokenKind::String => {
                // escaped quote such as '\"' is not a string
                if i > 0 && content[i - 1] == b'\\' {
                    continue;
                }
                // after code a doc string is an ordinary value
                return (
                    last,
                    LineType::Code,
                    State::String {
                        end: token.close,
                        skip_escape: token.ignore_escape,
                    },
                );
            }
            TokenKind::SingleLineComment => {
                return (last, LineType::Code, State::CommentSingle);
            }
            TokenKind::MultiLineComment => {
                return (
                    last,
                    LineType::Code,
                    State::CommentMulti {
                        stack: vec![token.close],
                    },
                );
            }
            TokenKind::Complexity => {
                if at_word_boundary(content, i) {
                    job.complexity += 1;
                }
            }
        }
    }

    (scan.last(), LineType::Code, State::Code)
}

fn comment_multi<'a>(
    scan: &Scan<'a>,
    index: usize,
    line_type: LineType,
    mut stack: Vec<&'a [u8]>,
) -> (usize, LineType, State<'a>) {
    let content = scan.content;

    for i in index..content.len() {
        if content[i] == b'\n' {
            return (i, line_type, State::CommentMulti { stack });
        }

        let Some(&close) = stack.last() else {
            return (i, line_type, State::Blank);
        };

        if check_for_match_single(content, i, close) {
            stack.pop();
            let last = i + close.len() - 1;
            if stack.is_empty() {
                return (last, line_type, State::Blank);
            }
            return (last, line_type, State::CommentMulti { stack });
        }

        if scan.feature.nested {
            if let Some(token) = scan.feature.multi_line_comments.match_at(&content[i..]) {
                stack.push(token.close);
                return (
                    i + token.len - 1,
                    line_type,
                    State::CommentMulti { stack },
                );
            }
        }
    }

    (scan.last(), line_type, State::CommentMulti { stack })
}

fn string<'a>(
    scan: &Scan<'a>,
    index: usize,
    end: &'a [u8],
    skip_escape: bool,
) -> (usize, LineType, State<'a>) {
    let content = scan.content;

    for i in index..content.len() {
        if content[i] == b'\n' {
            return (i, LineType::Code, State::String { end, skip_escape });
        }

        if (skip_escape || judge_escape(content, i)) && check_for_match_single(content, i, end) {
            return (i + end.len() - 1, LineType::Code, State::Code);
        }
    }

    (scan.last(), LineType::Code, State::String { end, skip_escape })
}

fn doc_string<'a>(
    scan: &Scan<'a>,
    index: usize,
    line_type: LineType,
    end: &'a [u8],
    skip_escape: bool,
) -> (usize, LineType, State<'a>) {
    let content = scan.content;

    for i in index..content.len() {
        if content[i] == b'\n' {
            return (i, line_type, State::DocString { end, skip_escape });
        }

        if !(skip_escape || judge_escape(content, i)) || !check_for_match_single(content, i, end) {
            continue;
        }

        // Only whitespace up to the newline makes the closing line a comment.
        // Anything else is handed back so the next state sees it.
        for x in i + end.len()..content.len() {
            if content[x] == b'\n' {
                return (x, LineType::Comment, State::Blank);
            }
            if !is_whitespace(content[x]) {
                return (x - 1, LineType::Code, State::Blank);
            }
        }
        return (scan.last(), LineType::Comment, State::Blank);
    }

    (scan.last(), line_type, State::DocString { end, skip_escape })
}
