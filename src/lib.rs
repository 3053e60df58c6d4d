//! A line-oriented search tool built around its own regular-expression
//! engine. The engine lives in [`regex`]; everything else is the thin shell
//! around it: argument parsing, file walking, the per-line search loop, and
//! output rendering.

pub mod app;
pub mod cli;
pub mod fs_walk;
pub mod output;
pub mod regex;
pub mod search;
