pub mod challenges;
pub mod complaints;
pub mod file_upload;
pub mod health;
pub mod xml_upload;
