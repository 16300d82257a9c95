pub mod init;
pub mod params;
pub mod preview;
pub mod score;
pub mod serve;
pub mod simulate;
