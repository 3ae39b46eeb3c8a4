//! Domain model for the Portfolio domain

pub mod dto;
pub mod entities;
