//! Repository implementations for database operations.

pub mod cluster;
pub mod grave;
pub mod instruction;
pub mod picture;
pub mod relation;
pub mod request;
pub mod search;
pub mod user;

pub use cluster::{ClusterDeletion, ClusterRepository};
pub use grave::GraveRepository;
pub use instruction::{InstructionRepository, StepRow};
pub use picture::{NewPicture, PictureRepository};
pub use relation::RelationRepository;
pub use request::{RequestRepository, StatusChange};
pub use search::SearchRepository;
pub use user::UserRepository;
