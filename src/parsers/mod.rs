pub mod anki;
pub mod line_kind;
pub mod quality;
pub mod vocabulary;
