pub mod crypto;
pub mod google;
pub mod mail;
pub mod storage;
