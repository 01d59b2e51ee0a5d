pub mod auth;
pub mod init;
pub mod ocr;
pub mod parser;
