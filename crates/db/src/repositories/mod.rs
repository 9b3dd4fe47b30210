//! Repository abstractions for data access.
//!
//! Repositories implement the storage seams declared in `sequora-core`
//! against Postgres, hiding the `SeaORM` implementation details from the
//! allocation service.

pub mod assignment;
pub mod config;
pub mod sequence;

pub use assignment::AssignmentRepository;
pub use config::NumberingConfigRepository;
pub use sequence::SequenceRepository;
