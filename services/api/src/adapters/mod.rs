pub mod codec;
pub mod json_file;
pub mod prompt_store;
pub mod record_store;
pub mod signature;
pub mod user_store;

pub use json_file::JsonFile;
pub use prompt_store::JsonPromptStore;
pub use signature::HmacSignatureVerifier;
pub use user_store::JsonUserStatusStore;
