//! Core business logic module - Contains all the main business logic for the storefront.
//! This module is organized into submodules for different domains:
//! accounts, addresses, catalog, orders, referrals, notifications and settings.

pub mod address;
pub mod admin;
pub mod auth;
pub mod cascade;
pub mod category;
pub mod dashboard;
pub mod notification;
pub mod order;
pub mod pricing;
pub mod product;
pub mod referral;
pub mod settings;
pub mod user;
