pub extern crate bincode;
pub extern crate serde;
pub extern crate serde_json;
pub extern crate uuid;

mod canvas_session;
mod error;
mod grid;
mod message;
mod render;
mod types;

pub use canvas_session::*;
pub use error::*;
pub use grid::*;
pub use message::*;
pub use render::*;
pub use types::*;
