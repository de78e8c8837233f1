pub mod config;
pub mod lap_tracker;
pub mod leaderboard;
pub mod notifications;
pub mod persistence;

pub mod models {
    pub mod lap;
    pub mod store;
}

pub mod helpers {
    pub mod format;
    pub mod logging;
    pub mod track_name;
}
