pub mod decrypt;
pub mod encrypt;
pub mod export;
pub mod init;
pub mod keygen;
pub mod version;

pub use decrypt::Decrypt;
pub use encrypt::Encrypt;
pub use export::Export;
pub use init::Init;
pub use keygen::Keygen;
pub use version::Version;
