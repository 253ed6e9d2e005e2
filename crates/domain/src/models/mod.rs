//! Domain models for the grave registry.

pub mod cluster;
pub mod expiration;
pub mod grave;
pub mod instruction;
pub mod picture;
pub mod relation;
pub mod request;
pub mod search;
pub mod user;

pub use cluster::{ClusterResponse, Coordinates, GraveCluster};
pub use grave::{GraveAttributes, GraveDetails, GraveResponse, GraveSummary};
pub use instruction::{ClusterInstructions, InstructionStep};
pub use picture::GravePicture;
pub use relation::{GraveRelation, RelationResponse};
pub use request::{RequestDetails, RequestStatus, ServiceRequest};
pub use user::{User, UserRole};
