pub mod encoding;
pub mod extract;
pub mod files;
pub mod http;
pub mod layout;
pub mod ocr;
pub mod report;
pub mod similarity;
pub mod translation_memory;
pub mod translator;
pub mod validate;
pub mod vocabulary_db;
pub mod writer;
