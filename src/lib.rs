// Hawaii Shell
//
// Desktop shell core for the Hawaii session: shell protocol state (surface
// layers, popup grabs, session lock) and supervision of the processes that
// make up a running session.

pub mod core;
pub mod session;
pub mod config;
pub mod util;
pub mod prelude;
