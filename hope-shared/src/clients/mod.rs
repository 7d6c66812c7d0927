pub mod db;
pub mod redis;
pub mod twilio;
