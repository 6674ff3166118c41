//! Explanation service implementations

pub mod openai;
