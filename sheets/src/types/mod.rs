//! Tipos do payload de sincronização

pub mod batch;

pub use batch::{BatchUpdate, BatchUpdateResponse, CellChange};
