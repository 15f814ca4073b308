pub mod book;
pub mod discussion;
pub mod goal;
pub mod list;
pub mod progress;
pub mod search;
pub mod user_profile;

pub use book::*;
pub use discussion::*;
pub use goal::*;
pub use list::*;
pub use progress::*;
pub use search::*;
pub use user_profile::*;
