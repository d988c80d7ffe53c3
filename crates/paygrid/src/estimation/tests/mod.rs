mod common;
mod grid;
