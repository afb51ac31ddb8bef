pub mod actions;
pub mod constants;
pub mod hidalgo;
pub mod leaderboard;
pub mod models;
pub mod realtime;
pub mod score_service;
pub mod scoring;
pub mod session;
pub mod store;
