//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod cluster;
pub mod grave;
pub mod instruction;
pub mod picture;
pub mod relation;
pub mod request;
pub mod user;

pub use cluster::{ClusterEntity, ClusterWithCountEntity};
pub use grave::{GraveEntity, GraveWithClusterEntity};
pub use instruction::{InstructionEntity, InstructionStepEntity};
pub use picture::PictureEntity;
pub use relation::{RelationDetailEntity, RelationEntity};
pub use request::{RequestDetailEntity, RequestEntity, RequestLogEntity, RequestStatusEntity};
pub use user::UserEntity;
