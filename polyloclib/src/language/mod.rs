//! Language definitions: the embedded table, its compiled token matchers and
//! name based language detection.

pub mod bloom;
pub mod data;
pub mod detect;
pub mod feature;
pub mod trie;

pub use bloom::{bloom_hash, BloomFilter, BLOOM_TABLE};
pub use data::{Language, Quote, EMBEDDED_LANGUAGES};
pub use detect::{detect_language, detect_shebang, determine_language, get_extension, Detection};
pub use feature::{LanguageDatabase, LanguageFeature};
pub use trie::{TokenKind, TokenMatch, TokenTrie};
