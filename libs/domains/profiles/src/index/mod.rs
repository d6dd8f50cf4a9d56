mod memory;
pub mod pinecone;
pub mod qdrant;
mod repository;

pub use memory::InMemoryProfileIndex;
pub use pinecone::{PineconeConfig, PineconeIndex};
pub use qdrant::{QdrantConfig, QdrantIndex};
pub use repository::ProfileIndex;

#[cfg(test)]
pub use repository::MockProfileIndex;
