pub mod domain;
pub mod ports;

pub use domain::{
    AuthContext, NewPrompt, PaymentNotification, Prompt, PromptPatch, SubscriptionStatus,
    UserStatus,
};
pub use ports::{
    PortError, PortResult, PromptRepository, SignatureVerifier, SubscriptionRepository,
};
