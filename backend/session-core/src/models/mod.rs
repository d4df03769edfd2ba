pub mod linking;
pub mod otp;
pub mod refresh_token;
pub mod user;

pub use linking::LinkingStateRecord;
pub use otp::OtpRequestRecord;
pub use refresh_token::RefreshTokenRecord;
pub use user::User;
