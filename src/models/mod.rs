pub mod proposal;

pub use proposal::{Person, ProposalRecord};
