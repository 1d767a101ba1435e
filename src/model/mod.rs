pub mod document;
pub mod entry;
pub mod ocr;
pub mod record;
