//! Core of the Alphabet language: front end, bytecode compiler and stack VM.

pub mod api;
pub mod compiler;
pub mod parser;
pub mod vm;
