pub mod warehouse;
