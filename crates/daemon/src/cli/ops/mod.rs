pub mod daemon;
pub mod health;
pub mod init;
pub mod upload;
pub mod version;

pub use daemon::Daemon;
pub use health::Health;
pub use init::Init;
pub use upload::Upload;
pub use version::Version;
