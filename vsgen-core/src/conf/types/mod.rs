pub mod entrypoint;
pub mod meta;
pub mod params;
pub mod policy;
pub mod upstream;
pub mod virtual_server;

pub use entrypoint::*;
pub use meta::*;
pub use params::*;
pub use policy::*;
pub use upstream::*;
pub use virtual_server::*;
