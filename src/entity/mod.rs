//! Entity and block-entity re-identification between the editions.

pub mod block_entities;
pub mod entities;
pub mod id_registry;
pub mod inventory;

pub use block_entities::{BlockEntityConverter, VanillaBlockEntities};
pub use entities::{entities_to_bedrock, entities_to_java, player_to_bedrock, player_to_java};
pub use id_registry::IdRegistry;
