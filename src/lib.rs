//! Service-provider panel for the EcoEdu carbon-credit marketplace.
//!
//! Session handling, enrollment decisions and proof inspection on top of the
//! marketplace HTTP API. Rendering is left to the embedding UI.

pub mod client;
pub mod config;
pub mod error;
pub mod notify;
pub mod state;
pub mod storage;

pub mod models {
    pub mod enrollment;
    pub mod proof;
    pub mod session;
}

pub mod repositories {
    pub mod auth;
    pub mod enrollment;
    pub mod proof;
}

pub mod services {
    pub mod enrollment;
    pub mod roster;
    pub mod session;
}

pub mod view_models {
    pub mod proof;
    pub mod roster;
}

pub mod validation {
    pub mod auth;
    pub mod enrollment;
}

pub use config::Config;
pub use error::{AppError, Result};
pub use state::PanelState;
