mod email;
mod slug;

pub use email::is_valid_email;
pub use slug::slugify;
