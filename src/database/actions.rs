mod engagement;
mod follows;
mod ingredients;
mod recipes;
mod users;

pub use engagement::*;
pub use follows::*;
pub use ingredients::*;
pub use recipes::*;
pub use users::*;
