//! Admission logic for AdvancedCronJob objects: decoding at any served
//! version, field validation, and update immutability.
#[macro_use]
extern crate lazy_static;

pub mod decode;
pub mod handler;
pub mod update;
pub mod validation;
