pub mod absence;
pub mod class;
pub mod class_selector;
pub mod client;
pub mod creds;
pub mod event;
pub mod services;
pub mod student;
pub mod types;

mod util;
