mod memory_indexer;
mod text_indexer;
mod tokenizer;

pub use memory_indexer::*;
pub use text_indexer::*;
pub use tokenizer::*;
