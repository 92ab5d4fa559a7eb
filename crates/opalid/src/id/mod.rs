mod final_id;
mod local;
mod op_space;
mod session;
mod session_space;
mod stable;

pub use final_id::*;
pub use local::*;
pub use op_space::*;
pub use session::*;
pub use session_space::*;
pub use stable::*;
