//! Text-side building blocks: normalization, sentence-aligned chunking,
//! lexical scoring and literal phrase extraction.

pub mod blocks;
pub mod chunk;
pub mod exact;
pub mod lexical;
pub mod normalize;
pub mod segment;

pub use chunk::chunk_text;
pub use exact::find_exact_matches;
pub use lexical::lexical_similarity;
pub use normalize::normalize;
pub use segment::{UnicodeSentenceSplitter, UnicodeWordTokenizer};
