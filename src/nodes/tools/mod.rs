//! Tool nodes.

pub mod openai_image_gen;

pub use openai_image_gen::OpenAIImageGenNode;
