// src/models.rs

pub mod activity;
pub mod attachment;
pub mod auth;
pub mod dashboard;
pub mod fields;
pub mod lead;
pub mod notification;
pub mod task;
pub mod team;
pub mod view;
