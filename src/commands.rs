pub mod quote;
pub mod serve;
pub mod session;
pub mod status;
pub mod sync;
pub mod transfer;
