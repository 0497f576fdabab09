pub mod config;
pub mod contact;
pub mod i18n;
pub mod pages;
pub mod retry;
pub mod server;
pub mod store;
pub mod switcher;
