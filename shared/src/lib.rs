#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate lazy_static;

pub mod acj;
pub mod image;
pub mod k8s;
