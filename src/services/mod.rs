pub mod ingest;
pub mod keys;
pub mod playback;
pub mod probe;
pub mod remux;
pub mod storage;
pub mod video_store;
