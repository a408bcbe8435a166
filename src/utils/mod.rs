pub mod colunas;
pub mod error;
pub mod logging;

pub use error::*;
pub use colunas::normalizar_segmento;
