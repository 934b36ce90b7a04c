pub mod auth;
pub mod dashboard;
pub mod parts;
pub mod resource;
pub mod work_orders;
