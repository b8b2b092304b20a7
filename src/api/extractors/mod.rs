pub mod auth;
pub mod broker;
pub mod site;
pub mod visitor;
