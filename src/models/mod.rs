pub mod stock;
pub mod news;
pub mod response;
pub mod rpc;

pub use stock::*;
pub use news::*;
pub use response::*;
pub use rpc::*;
