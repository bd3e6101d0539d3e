mod email_address;
mod role_description;

pub use email_address::EmailAddress;
pub use role_description::RoleDescription;
