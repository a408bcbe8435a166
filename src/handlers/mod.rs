// Handlers da API do middleware
pub mod edits;
pub mod health;
pub mod planilha;
pub mod webhook;

pub use edits::*;
pub use health::*;
pub use planilha::*;
pub use webhook::*;
