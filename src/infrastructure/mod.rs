pub mod assets;
pub mod database;
pub mod storage;
