//! Multi-pattern token matcher.
//!
//! All markers of a language live in one byte trie. Matching walks the trie
//! from a position in the content and reports the deepest terminal node seen,
//! so `"""` wins over `"` and `/**` over `/*` whenever both apply. When two
//! definitions spell the same marker, the one inserted last wins.

/// Category of a matched marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    String,
    SingleLineComment,
    MultiLineComment,
    Complexity,
}

/// What a terminal node resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Terminal {
    kind: TokenKind,
    close: Box<[u8]>,
    ignore_escape: bool,
    doc_string: bool,
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: Vec<(u8, u32)>,
    terminal: Option<Terminal>,
}

impl Node {
    #[inline]
    fn child(&self, byte: u8) -> Option<u32> {
        self.children
            .iter()
            .find(|(b, _)| *b == byte)
            .map(|(_, index)| *index)
    }
}

/// Result of a successful match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMatch<'a> {
    pub kind: TokenKind,
    /// Bytes covered by the opening marker
    pub len: usize,
    /// Closing marker for strings and block comments, empty otherwise
    pub close: &'a [u8],
    pub ignore_escape: bool,
    pub doc_string: bool,
}

/// Byte trie over a language's markers.
#[derive(Debug, Clone)]
pub struct TokenTrie {
    nodes: Vec<Node>,
}

impl Default for TokenTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// True when nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Insert a marker with no closing counterpart.
    pub fn insert(&mut self, kind: TokenKind, token: &[u8]) {
        self.insert_terminal(
            token,
            Terminal {
                kind,
                close: Box::default(),
                ignore_escape: false,
                doc_string: false,
            },
        );
    }

    /// Insert an opening marker together with the bytes that close it.
    pub fn insert_close(&mut self, kind: TokenKind, open: &[u8], close: &[u8]) {
        self.insert_terminal(
            open,
            Terminal {
                kind,
                close: close.into(),
                ignore_escape: false,
                doc_string: false,
            },
        );
    }

    /// Insert a string opener carrying its escape and docstring behaviour.
    pub fn insert_quote(&mut self, open: &[u8], close: &[u8], ignore_escape: bool, doc_string: bool) {
        self.insert_terminal(
            open,
            Terminal {
                kind: TokenKind::String,
                close: close.into(),
                ignore_escape,
                doc_string,
            },
        );
    }

    fn insert_terminal(&mut self, token: &[u8], terminal: Terminal) {
        let mut current = 0usize;
        for &byte in token {
            current = match self.nodes[current].child(byte) {
                Some(next) => next as usize,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[current].children.push((byte, next as u32));
                    next
                }
            };
        }
        self.nodes[current].terminal = Some(terminal);
    }

    /// Longest marker starting at the beginning of `content`, if any.
    pub fn match_at(&self, content: &[u8]) -> Option<TokenMatch<'_>> {
        let mut current = 0usize;
        let mut best = None;

        for (depth, &byte) in content.iter().enumerate() {
            match self.nodes[current].child(byte) {
                Some(next) => current = next as usize,
                None => break,
            }
            if let Some(terminal) = &self.nodes[current].terminal {
                best = Some(TokenMatch {
                    kind: terminal.kind,
                    len: depth + 1,
                    close: &terminal.close,
                    ignore_escape: terminal.ignore_escape,
                    doc_string: terminal.doc_string,
                });
            }
        }

        best
    }
}
