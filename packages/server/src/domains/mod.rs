// Business domains
pub mod hints;
pub mod intake;
pub mod matching;
pub mod providers;
pub mod schedules;
