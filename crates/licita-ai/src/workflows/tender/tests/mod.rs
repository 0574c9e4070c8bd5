mod common;
mod profile;
mod scoring;
