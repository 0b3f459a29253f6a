//! Stock insight pipeline: configuration, orchestration and the command-line
//! front end over [`market_data`] and [`price_analytics`].

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod render;
