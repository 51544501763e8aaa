// Library root
// -----------
// This crate exposes the pieces of the `hss` shell as a library. The binary
// (`main.rs`) parses flags, sets up logging and starts either the
// interactive shell or the smoke test.
//
// Module responsibilities:
// - `api`: HTTP calls against the file store and their typed errors.
// - `session`: current directory, path joining and the entries cache.
// - `command`: command table and line parsing.
// - `commands`: one handler per command.
// - `completion`: tab completion for the prompt.
// - `ui`: the read-eval-print loop and its input sources.
// - `smoke`: end-to-end check of a running server.
pub mod api;
pub mod command;
pub mod commands;
pub mod completion;
pub mod session;
pub mod smoke;
pub mod ui;
