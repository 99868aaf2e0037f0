pub mod activity_log;
pub mod db_utils;
pub mod username;
