#[macro_use]
extern crate serde;

#[macro_use]
extern crate async_trait;

#[macro_use]
extern crate log;

#[macro_use]
extern crate safe_result;

macro_rules! auto_derived {
    ( $( $item:item )+ ) => {
        $(
            #[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
            $item
        )+
    };
}

mod gateway;
mod loader;
mod models;
mod service;

pub use gateway::*;
pub use loader::OverviewLoader;
pub use models::*;
pub use service::{OverviewOptions, SafeOverviews};

#[cfg(test)]
mod test;
