pub mod document_serve;
pub mod health;
