mod answer;
mod question;
mod quiz;
mod section;
mod user;
mod value;

pub use answer::*;
pub use question::*;
pub use quiz::*;
pub use section::*;
pub use user::*;
pub use value::*;
