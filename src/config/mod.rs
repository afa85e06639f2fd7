//! Configuration: [`Config`] from the environment (and `.env`), plus the
//! defaults and fixed values it falls back on.

mod constants;
mod settings;

pub use constants::*;
pub use settings::Config;
