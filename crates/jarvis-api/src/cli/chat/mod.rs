//! Interactive terminal chat client for Jarvis.
//!
//! Keeps a visible transcript, sends each message to the backend under the
//! client's random user identifier, and always appends an assistant line
//! (reply or error) for every user message. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod client;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
