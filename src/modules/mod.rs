pub mod bulk;
pub mod question;
pub mod quiz;
pub mod section;
pub mod value;
