//! # Text Tokenization Module
//!
//! Turns raw page or PDF text into the word sequence stored in the
//! word-frequency datasets. Frequencies are never computed here: every kept
//! token becomes one output row, so duplicates and order are preserved.
//!
//! ## Key Components
//!
//! - `Tokenizer`: letter-run matcher with normalization and filtering
//! - `StopwordSet`: English and Portuguese stopwords plus site furniture terms
//! - `tokenize`: convenience function using the standard stopword set

mod stopwords;
mod tokenizer;

pub use stopwords::{DOMAIN_STOPWORDS, StopwordSet};
pub use tokenizer::{Tokenizer, normalize_token, tokenize};
