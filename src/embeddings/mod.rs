pub mod openai;
pub mod table;

pub use openai::OpenAIEmbedder;
pub use table::EmbeddingTable;
