pub mod cache {
    pub mod error;
    pub mod port;
}
pub mod chart {
    pub mod entity;
    pub mod port;
}
pub mod common;
pub mod config;
pub mod indicator {
    pub mod entity;
}
pub mod market {
    pub mod entity;
    pub mod error;
    pub mod port;
}
pub mod notify {
    pub mod entity;
    pub mod error;
    pub mod port;
}
pub mod performance {
    pub mod entity;
}
pub mod universe {
    pub mod error;
    pub mod port;
}

#[cfg(feature = "test-utils")]
pub mod test_utils;
