pub mod admin;
pub mod courses;
pub mod lessons;
pub mod login;
pub mod modules;
pub mod programs;
pub mod progress;
