pub mod notifier;
pub use notifier::{Notifier, SmtpNotifier};

pub mod token;
pub use token::TokenService;

pub mod takeout;
pub use takeout::{StoreTakeoutService, TakeoutData, TakeoutError, TakeoutImage, TakeoutService};

pub mod wipeout;
pub use wipeout::{StoreWipeoutService, WipeoutError, WipeoutService};
