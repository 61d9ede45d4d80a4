//! Glidepath Server
//!
//! Serves a soaring club's page tree and decides, page by page, who may
//! view and edit it.

pub mod access;
pub mod admin;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod pages;
