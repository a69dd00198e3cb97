pub mod address;
pub mod bucket;
pub mod commands;
pub mod error;
pub mod hash;
pub mod logger;
pub mod shared_pool;
pub mod store;
pub mod unspent_pool;
pub mod ux_out;

pub use self::{
    address::*, bucket::*, error::*, hash::*, shared_pool::*, store::*, unspent_pool::*,
    ux_out::*,
};
