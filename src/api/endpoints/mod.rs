pub mod health;
pub mod notify;
pub mod ocr;
pub mod status;
